// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Invocation of an external minimal solver for the trifocal
//! three point-tangent problem.
//!
//! The solver itself (typically a homotopy continuation on a fixed polynomial
//! system) is a black box behind [`MinimalSolver`]. It is nondeterministic and
//! may fail to converge on a given run, so [`TrifocalSolver`] retries it a
//! bounded number of times before giving up.

#[cfg(feature = "consensus")]
pub mod consensus;

use crate::error::{Error, Result};
use crate::model::{QuatTranslation, RelativeCameras, TrifocalModel, NVIEWS};
use crate::probe::DEFAULT_TOLERANCE;
use log::{debug, warn};
use nalgebra::DMatrix;

/// Number of correspondences of a minimal sample.
pub const NPOINTS: usize = 3;

/// Default number of solve attempts before reporting [`Error::SolveFailed`].
pub const MAX_SOLVE_TRIES: usize = 5;

/// Point positions and tangents in the dense layout the solver expects,
/// indexed `[view][point][coordinate]`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PackedCorrespondences {
    /// Normalized positions.
    pub points: [[[f64; 2]; NPOINTS]; NVIEWS],
    /// Normalized tangent directions.
    pub tangents: [[[f64; 2]; NPOINTS]; NVIEWS],
}

/// Output of one converged solver run.
///
/// `cameras` holds every solution slot of the solver, valid or not,
/// and `ids` selects the valid ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSolutions {
    /// All solution slots, row-major.
    pub cameras: Vec<RelativeCameras>,
    /// Indices of the valid slots.
    pub ids: Vec<usize>,
}

/// Capability of an external algebraic solver.
pub trait MinimalSolver {
    /// Fixed number of solution slots of the solver.
    const MAX_SOLUTIONS: usize;

    /// Run the solver once.
    /// Return `None` when this run did not converge.
    fn solve(&self, correspondences: &PackedCorrespondences) -> Option<RawSolutions>;

    /// Whether a candidate describes the same geometry as the reference,
    /// modulo the symmetries of the solver output.
    fn equivalent(&self, candidate: &QuatTranslation, reference: &QuatTranslation) -> bool {
        candidate.equivalent(reference, DEFAULT_TOLERANCE)
    }
}

impl<'a, S: MinimalSolver> MinimalSolver for &'a S {
    const MAX_SOLUTIONS: usize = S::MAX_SOLUTIONS;

    fn solve(&self, correspondences: &PackedCorrespondences) -> Option<RawSolutions> {
        (**self).solve(correspondences)
    }

    fn equivalent(&self, candidate: &QuatTranslation, reference: &QuatTranslation) -> bool {
        (**self).equivalent(candidate, reference)
    }
}

/// Pack three `4 x 3` matrices into the solver layout.
///
/// Each column of `datum[view]` is one point: `(x, y, tangent x, tangent y)`.
pub fn pack(datum: [&DMatrix<f64>; NVIEWS]) -> Result<PackedCorrespondences> {
    let mut packed = PackedCorrespondences::default();
    for (view, data) in datum.iter().enumerate() {
        if data.nrows() != 4 || data.ncols() != NPOINTS {
            return Err(Error::ShapeMismatch {
                view,
                rows: data.nrows(),
                cols: data.ncols(),
            });
        }
        for ip in 0..NPOINTS {
            packed.points[view][ip] = [data[(0, ip)], data[(1, ip)]];
            packed.tangents[view][ip] = [data[(2, ip)], data[(3, ip)]];
        }
    }
    Ok(packed)
}

/// Convert a converged run into camera triples, in id order.
///
/// Only the first `max_solutions` slots are valid. Ids pointing outside of
/// them and repeated ids are skipped, so at most `max_solutions` models
/// are returned.
pub fn models_from_raw(raw: &RawSolutions, max_solutions: usize) -> Vec<TrifocalModel> {
    let nslots = raw.cameras.len().min(max_solutions);
    let mut taken = vec![false; nslots];
    let mut models = Vec::with_capacity(raw.ids.len().min(nslots));
    for &id in &raw.ids {
        if id >= nslots {
            warn!(
                "solution id {} out of {} solver slots, skipping it",
                id, nslots
            );
            continue;
        }
        if taken[id] {
            warn!("solution id {} repeated, skipping it", id);
            continue;
        }
        taken[id] = true;
        models.push(TrifocalModel::from_relative(&raw.cameras[id]));
    }
    models
}

/// Trifocal solver from three point-tangent correspondences.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrifocalSolver<S> {
    solver: S,
    max_solve_tries: usize,
}

impl<S: MinimalSolver> TrifocalSolver<S> {
    /// Wrap an external solver, retrying it up to [`MAX_SOLVE_TRIES`] times.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            max_solve_tries: MAX_SOLVE_TRIES,
        }
    }

    /// Set the maximum number of solve attempts.
    ///
    /// Default is `5`.
    #[must_use]
    pub fn max_solve_tries(self, max_solve_tries: usize) -> Self {
        Self {
            max_solve_tries,
            ..self
        }
    }

    /// The wrapped external solver.
    pub fn inner(&self) -> &S {
        &self.solver
    }

    /// Solve for the candidate camera triples of three correspondences.
    ///
    /// `datum[view]` is a `4 x 3` matrix with one normalized point per column.
    /// Solutions come in the order of the solver ids, which carries no meaning.
    pub fn solve(&self, datum: [&DMatrix<f64>; NVIEWS]) -> Result<Vec<TrifocalModel>> {
        let packed = pack(datum)?;
        self.solve_packed(&packed)
    }

    /// Same as [`TrifocalSolver::solve`] on already packed correspondences.
    pub fn solve_packed(&self, packed: &PackedCorrespondences) -> Result<Vec<TrifocalModel>> {
        for attempt in 1..=self.max_solve_tries {
            if let Some(raw) = self.solver.solve(packed) {
                let models = models_from_raw(&raw, S::MAX_SOLUTIONS);
                debug!(
                    "solver converged on attempt {} with {} solutions",
                    attempt,
                    models.len()
                );
                return Ok(models);
            }
            warn!(
                "solver failed to converge on attempt {}/{}",
                attempt, self.max_solve_tries
            );
        }
        Err(Error::SolveFailed {
            attempts: self.max_solve_tries,
        })
    }
}
