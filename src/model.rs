// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Camera triples and their conversions.
//!
//! A [`TrifocalModel`] holds three $3 \times 4$ camera matrices
//! $[\bm{R_v} \ | \ \bm{t_v}]$ expressed in the frame of view 0,
//! so that the first camera is always $[\bm{I} \ | \ \bm{0}]$.

use nalgebra::{Matrix3, Matrix3x4, Quaternion, Rotation3, UnitQuaternion, Vector3, Vector4};

/// Number of views of a trifocal model.
pub const NVIEWS: usize = 3;

/// Relative cameras of views 1 and 2 as laid out by the solver:
/// `[view - 1][row][col]` where rows 0 to 2 are the rotation rows
/// and row 3 is the translation.
pub type RelativeCameras = [[[f64; 3]; 4]; NVIEWS - 1];

/// Three camera matrices, the first one being `[I | 0]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrifocalModel {
    cameras: [Matrix3x4<f64>; NVIEWS],
}

impl TrifocalModel {
    /// Build a model from the rotations and translations of views 1 and 2.
    pub fn from_parts(rotations: [Matrix3<f64>; 2], translations: [Vector3<f64>; 2]) -> Self {
        let mut cameras = [Matrix3x4::identity(); NVIEWS];
        for v in 1..NVIEWS {
            let camera = &mut cameras[v];
            for r in 0..3 {
                for c in 0..3 {
                    camera[(r, c)] = rotations[v - 1][(r, c)];
                }
                camera[(r, 3)] = translations[v - 1][r];
            }
        }
        Self { cameras }
    }

    /// Convert the row-major solver block of views 1 and 2.
    ///
    /// The solver is row-major while nalgebra is column-major,
    /// so every entry is copied one by one.
    pub fn from_relative(relative: &RelativeCameras) -> Self {
        let mut cameras = [Matrix3x4::identity(); NVIEWS];
        for v in 1..NVIEWS {
            let block = &relative[v - 1];
            for ir in 0..3 {
                for ic in 0..3 {
                    cameras[v][(ir, ic)] = block[ir][ic];
                }
            }
            for r in 0..3 {
                cameras[v][(r, 3)] = block[3][r];
            }
        }
        Self { cameras }
    }

    /// Inverse of [`TrifocalModel::from_relative`].
    pub fn to_relative(&self) -> RelativeCameras {
        let mut relative = [[[0.0; 3]; 4]; NVIEWS - 1];
        for v in 1..NVIEWS {
            for r in 0..3 {
                for c in 0..3 {
                    relative[v - 1][r][c] = self.cameras[v][(r, c)];
                }
                relative[v - 1][3][r] = self.cameras[v][(r, 3)];
            }
        }
        relative
    }

    /// All three camera matrices.
    pub fn cameras(&self) -> &[Matrix3x4<f64>; NVIEWS] {
        &self.cameras
    }

    /// Camera matrix of one view.
    ///
    /// Panics if `view >= 3`.
    pub fn camera(&self, view: usize) -> &Matrix3x4<f64> {
        &self.cameras[view]
    }

    /// The 3x3 linear part of a camera.
    pub fn rotation(&self, view: usize) -> Matrix3<f64> {
        let camera = &self.cameras[view];
        Matrix3::from_fn(|r, c| camera[(r, c)])
    }

    /// The translation column of a camera.
    pub fn translation(&self, view: usize) -> Vector3<f64> {
        self.cameras[view].column(3).into_owned()
    }
}

/// Quaternion-translation form of views 1 and 2, 14 scalars laid out as
/// `[quat_1, quat_2, trans_1, trans_2]`.
///
/// The quaternion of a view encodes the transposed rotation block
/// $\bm{R_v}^\top$, the orientation of camera $v$ in the frame of view 0.
/// Quaternions are stored `[x, y, z, w]`, the real coefficient last.
/// View 0 is always the identity and is left out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuatTranslation(pub [f64; 14]);

impl QuatTranslation {
    /// Convert a model, assuming camera 0 is `[I | 0]` and the rotation blocks
    /// are close to orthonormal.
    pub fn from_model(model: &TrifocalModel) -> Self {
        let mut qt = [0.0; 14];
        for v in 1..NVIEWS {
            let rot = Rotation3::from_matrix_unchecked(model.rotation(v).transpose());
            let quat = UnitQuaternion::from_rotation_matrix(&rot);
            qt[4 * (v - 1)..4 * v].copy_from_slice(quat.coords.as_slice());
            let trans = model.translation(v);
            let offset = 8 + 3 * (v - 1);
            qt[offset..offset + 3].copy_from_slice(trans.as_slice());
        }
        Self(qt)
    }

    /// Rebuild the camera triple. Quaternions are normalized first.
    pub fn to_model(&self) -> TrifocalModel {
        TrifocalModel::from_parts(
            [
                self.rotation(1).to_rotation_matrix().into_inner().transpose(),
                self.rotation(2).to_rotation_matrix().into_inner().transpose(),
            ],
            [self.translation(1), self.translation(2)],
        )
    }

    /// Raw quaternion coefficients `[x, y, z, w]` of view 1 or 2.
    pub fn quaternion(&self, view: usize) -> Vector4<f64> {
        assert!(view == 1 || view == 2, "view {} has no quaternion", view);
        Vector4::from_column_slice(&self.0[4 * (view - 1)..4 * view])
    }

    /// Orientation of view 1 or 2, the inverse of its camera rotation.
    pub fn rotation(&self, view: usize) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(Quaternion::from(self.quaternion(view)))
    }

    /// Translation of view 1 or 2.
    pub fn translation(&self, view: usize) -> Vector3<f64> {
        assert!(view == 1 || view == 2, "view {} has no translation", view);
        let offset = 8 + 3 * (view - 1);
        Vector3::from_column_slice(&self.0[offset..offset + 3])
    }
}
