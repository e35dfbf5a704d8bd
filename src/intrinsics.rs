// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel to normalized coordinate conversions for an upper triangular
//! calibration matrix.
//!
//! Only the first two rows of K are stored, the last one is always `[0, 0, 1]`:
//! $$
//! \bm{K} = \begin{bmatrix} f_x & s & c_x \\\\ 0 & f_y & c_y \end{bmatrix}
//! $$

use nalgebra::{DMatrix, Vector2};

/// The two informative rows of a calibration matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Intrinsics(pub [[f64; 3]; 2]);

impl Intrinsics {
    /// Build from focal lengths, skew and principal point.
    pub fn new(fx: f64, fy: f64, skew: f64, cx: f64, cy: f64) -> Self {
        Self([[fx, skew, cx], [0.0, fy, cy]])
    }

    /// Map a normalized point to pixel coordinates.
    pub fn apply(&self, normalized: &Vector2<f64>) -> Vector2<f64> {
        let k = &self.0;
        Vector2::new(
            normalized.x * k[0][0] + normalized.y * k[0][1] + k[0][2],
            normalized.y * k[1][1] + k[1][2],
        )
    }

    /// Map a pixel point to normalized coordinates.
    pub fn invert(&self, pixel: &Vector2<f64>) -> Vector2<f64> {
        let k = &self.0;
        let y = (pixel.y - k[1][2]) / k[1][1];
        let x = (pixel.x - k[0][1] * y - k[0][2]) / k[0][0];
        Vector2::new(x, y)
    }

    /// Map a pixel tangent direction to a unit normalized tangent direction.
    ///
    /// Directions are not affected by the principal point.
    /// A zero tangent stays zero.
    pub fn invert_tangent(&self, pixel_tangent: &Vector2<f64>) -> Vector2<f64> {
        let k = &self.0;
        let y = pixel_tangent.y / k[1][1];
        let x = (pixel_tangent.x - k[0][1] * y) / k[0][0];
        let tangent = Vector2::new(x, y);
        tangent.try_normalize(0.0).unwrap_or(tangent)
    }

    /// Convert every column `(x, y, tangent x, tangent y)` of a pixel
    /// correspondence matrix into normalized coordinates.
    ///
    /// Matrices with fewer than 4 rows only get their positions converted.
    pub fn normalize_datum(&self, datum: &DMatrix<f64>) -> DMatrix<f64> {
        let mut normalized = datum.clone();
        if datum.nrows() < 2 {
            return normalized;
        }
        for c in 0..datum.ncols() {
            let p = self.invert(&Vector2::new(datum[(0, c)], datum[(1, c)]));
            normalized[(0, c)] = p.x;
            normalized[(1, c)] = p.y;
            if datum.nrows() >= 4 {
                let t = self.invert_tangent(&Vector2::new(datum[(2, c)], datum[(3, c)]));
                normalized[(2, c)] = t.x;
                normalized[(3, c)] = t.y;
            }
        }
        normalized
    }
}
