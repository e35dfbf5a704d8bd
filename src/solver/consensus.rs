// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration with [`sample_consensus`].

use crate::intrinsics::Intrinsics;
use crate::model::{TrifocalModel, NVIEWS};
use crate::reprojection::{self, Bearing};
use crate::solver::{MinimalSolver, TrifocalSolver, NPOINTS};
use log::warn;
use nalgebra::DMatrix;
use sample_consensus::{Estimator, Model};

/// One point tracked across the three views.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrifocalSample {
    /// Normalized `(x, y, tangent x, tangent y)` per view.
    pub bearings: [Bearing; NVIEWS],
    /// The same observations in pixels.
    pub pixel_bearings: [Bearing; NVIEWS],
}

/// A candidate camera triple together with the calibration used to score it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrifocalHypothesis {
    /// Candidate cameras.
    pub model: TrifocalModel,
    /// Calibration of the pixel observations.
    pub intrinsics: Intrinsics,
}

impl Model<TrifocalSample> for TrifocalHypothesis {
    fn residual(&self, data: &TrifocalSample) -> f64 {
        reprojection::error(
            &self.model,
            &data.bearings,
            &data.pixel_bearings,
            &self.intrinsics,
        )
    }
}

/// This implements the [`sample_consensus::Estimator`] trait.
///
/// Every minimal sample of three tracks is handed to the wrapped
/// [`TrifocalSolver`]; a sample the solver cannot handle yields no hypothesis.
pub struct TrifocalEstimator<S> {
    /// Solver run on every minimal sample.
    pub solver: TrifocalSolver<S>,
    /// Calibration given to every hypothesis.
    pub intrinsics: Intrinsics,
}

impl<S: MinimalSolver> Estimator<TrifocalSample> for TrifocalEstimator<S> {
    type Model = TrifocalHypothesis;
    type ModelIter = Vec<TrifocalHypothesis>;
    const MIN_SAMPLES: usize = NPOINTS;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = TrifocalSample> + Clone,
    {
        let samples: Vec<TrifocalSample> = data.take(NPOINTS).collect();
        let datum: Vec<DMatrix<f64>> = (0..NVIEWS)
            .map(|v| DMatrix::from_fn(4, samples.len(), |r, c| samples[c].bearings[v][r]))
            .collect();
        match self.solver.solve([&datum[0], &datum[1], &datum[2]]) {
            Ok(models) => models
                .into_iter()
                .map(|model| TrifocalHypothesis {
                    model,
                    intrinsics: self.intrinsics,
                })
                .collect(),
            Err(e) => {
                warn!("no hypothesis from sample: {}", e);
                Vec::new()
            }
        }
    }
}
