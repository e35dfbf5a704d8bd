// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type of the crate.

/// Failures surfaced by the trifocal pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A correspondence matrix is not 4 rows (x, y, tangent x, tangent y) by 3 points.
    #[error("correspondences of view {view} must be 4x3, got {rows}x{cols}")]
    ShapeMismatch {
        /// Offending view.
        view: usize,
        /// Rows found.
        rows: usize,
        /// Columns found.
        cols: usize,
    },
    /// The external solver did not converge on any attempt.
    #[error("solver failed to converge after {attempts} attempts")]
    SolveFailed {
        /// Number of attempts made.
        attempts: usize,
    },
    /// A feature source could not provide the features of a view.
    #[error("invalid features for view {view}: {reason}")]
    FeatureLoad {
        /// View whose features are missing.
        view: u32,
        /// What went wrong.
        reason: String,
    },
}

/// Result of the fallible operations of this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
