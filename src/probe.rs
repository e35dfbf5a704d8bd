// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Search for a known camera triple among solver candidates.
//!
//! This is used to certify a solver run on synthetic data.
//! Raw matrices of distinct candidates are never compared entry by entry:
//! the solver output is only defined up to a group of symmetries, so the
//! comparison goes through [`MinimalSolver::equivalent`].

use crate::model::{QuatTranslation, TrifocalModel};
use crate::solver::MinimalSolver;
use log::debug;
use nalgebra::{Vector4, Vector6};

/// Default tolerance of [`QuatTranslation::equivalent`].
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

impl QuatTranslation {
    /// Compare two configurations up to the sign of each quaternion and
    /// a positive global scale of the translations.
    pub fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        let same_rotations = (1..=2).all(|v| {
            let a = normalize4(self.quaternion(v));
            let b = normalize4(other.quaternion(v));
            (a - b).norm().min((a + b).norm()) < tolerance
        });
        same_rotations && (self.translations() - other.translations()).norm() < tolerance
    }

    /// Translations of views 1 and 2 stacked and scaled to unit length.
    fn translations(&self) -> Vector6<f64> {
        let t = Vector6::from_column_slice(&self.0[8..14]);
        t.try_normalize(f64::EPSILON).unwrap_or(t)
    }
}

fn normalize4(q: Vector4<f64>) -> Vector4<f64> {
    q.try_normalize(f64::EPSILON).unwrap_or(q)
}

/// Find the index of the first solution matching `ground_truth`.
///
/// Every model is converted to quaternion-translation form and compared
/// with the solver's own notion of equivalence.
/// `None` means no candidate matched.
pub fn probe_solutions<S: MinimalSolver>(
    solver: &S,
    solutions: &[TrifocalModel],
    ground_truth: &TrifocalModel,
) -> Option<usize> {
    let reference = QuatTranslation::from_model(ground_truth);
    let found = solutions
        .iter()
        .map(QuatTranslation::from_model)
        .position(|candidate| solver.equivalent(&candidate, &reference));
    match found {
        Some(index) => debug!("ground truth found at solution {}", index),
        None => debug!("ground truth not among {} solutions", solutions.len()),
    }
    found
}
