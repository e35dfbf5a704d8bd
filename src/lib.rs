// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![warn(missing_docs)]

//! This package computes candidate geometries of three calibrated views
//! from three points observed in every view, each point carrying a tangent direction.
//!
//! The problem is minimal: three point-tangent correspondences give a finite
//! number of algebraic solutions, found by an external polynomial system solver
//! such as the "Chicago" problem of [MINUS][minus]:
//!
//!  - Trifocal Pose Estimation from Point-Tangent Correspondences (Chicago).
//!    Ricardo Fabbri, Timothy Duff, Hongyi Fan, Margaret Regan, David da Costa de Pinho,
//!    Elias Tsigaridas, Charles Wampler, Jonathan Hauenstein, Benjamin Kimia,
//!    Anton Leykin, Peter Giblin. CVPR 2020. ([paper][trifocal])
//!
//! This crate packs the correspondences for the solver ([`solver::pack`]),
//! retries it when it does not converge ([`TrifocalSolver`]),
//! turns its output into camera triples ([`TrifocalModel`]),
//! scores a triple with a reprojection error ([`reprojection::error`])
//! and finds a known configuration among the candidates ([`probe::probe_solutions`]).
//!
//! [minus]: https://github.com/rfabbri/minus
//! [trifocal]: https://arxiv.org/abs/1903.10008

pub mod error;
pub mod features;
pub mod intrinsics;
pub mod model;
pub mod probe;
pub mod reprojection;
pub mod solver;

pub use error::{Error, Result};
pub use intrinsics::Intrinsics;
pub use model::{QuatTranslation, TrifocalModel};
pub use solver::{MinimalSolver, TrifocalSolver};
