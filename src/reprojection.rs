// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scoring of a candidate camera triple against one correspondence.

use crate::intrinsics::Intrinsics;
use crate::model::{TrifocalModel, NVIEWS};
use float_ord::FloatOrd;
use log::{trace, warn};
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector2, Vector3, Vector4};

/// A point observation `(x, y, tangent x, tangent y)`.
pub type Bearing = Vector4<f64>;

/// Convergence threshold of the triangulation SVD.
pub const SVD_EPSILON: f64 = 1e-12;

/// Iteration cap of the triangulation SVD.
pub const SVD_MAX_ITERATIONS: usize = 1000;

/// Linear (DLT) triangulation of a homogeneous 3D point from two cameras
/// and the homogeneous image points `x1` and `x2`.
///
/// The result is the right singular vector of the smallest singular value,
/// with unit norm and an arbitrary sign.
/// Returns `None` if the SVD does not converge.
pub fn triangulate_dlt(
    p1: &Matrix3x4<f64>,
    x1: &Vector3<f64>,
    p2: &Matrix3x4<f64>,
    x2: &Vector3<f64>,
) -> Option<Vector4<f64>> {
    let design = Matrix4::from_rows(&[
        p1.row(2) * x1[0] - p1.row(0) * x1[2],
        p1.row(2) * x1[1] - p1.row(1) * x1[2],
        p2.row(2) * x2[0] - p2.row(0) * x2[2],
        p2.row(2) * x2[1] - p2.row(1) * x2[2],
    ]);
    let svd = design.try_svd(false, true, SVD_EPSILON, SVD_MAX_ITERATIONS)?;
    let (ix, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by_key(|&(_, &s)| FloatOrd(s))?;
    Some(svd.v_t?.row(ix).transpose())
}

/// Pick the pair of views to triangulate from.
///
/// View 0 is paired with whichever of views 1 and 2 has the longer
/// translation, the remaining view is returned as the one to score against.
/// Only those two baselines are compared.
pub fn third_view(model: &TrifocalModel) -> usize {
    if model.translation(1).norm_squared() > model.translation(2).norm_squared() {
        2
    } else {
        1
    }
}

/// Squared reprojection error of one correspondence in the third view.
///
/// The point is triangulated from view 0 and the wider of the two other
/// baselines, see [`third_view`], then reprojected into the remaining view.
/// The error is measured in the units of `bearings`, usually normalized
/// coordinates. `pixel_bearings` and `intrinsics` only feed diagnostics and
/// the tangent channels are not used.
///
/// A correspondence that cannot be triangulated scores `f64::INFINITY`.
pub fn error(
    model: &TrifocalModel,
    bearings: &[Bearing; NVIEWS],
    pixel_bearings: &[Bearing; NVIEWS],
    intrinsics: &Intrinsics,
) -> f64 {
    // One homogeneous point x, y, 1 per column.
    let bearing = Matrix3::from_columns(&[
        bearings[0].xy().push(1.0),
        bearings[1].xy().push(1.0),
        bearings[2].xy().push(1.0),
    ]);

    let third = third_view(model);
    let paired = NVIEWS - third;
    let triangulated = match triangulate_dlt(
        model.camera(0),
        &bearing.column(0).into_owned(),
        model.camera(paired),
        &bearing.column(paired).into_owned(),
    ) {
        Some(triangulated) => triangulated,
        None => {
            warn!("triangulation from views 0 and {} did not converge", paired);
            return f64::INFINITY;
        }
    };
    trace!("triangulated {:?} to score view {}", triangulated, third);

    let projected = model.camera(third) * triangulated;
    let reprojected = Vector2::new(projected.x / projected.z, projected.y / projected.z);
    trace!(
        "reprojected {:?} px, observed {:?} px",
        intrinsics.apply(&reprojected),
        pixel_bearings[third].xy()
    );

    (reprojected - bearing.column(third).xy()).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn model(t1: Vector3<f64>, t2: Vector3<f64>) -> TrifocalModel {
        TrifocalModel::from_parts(
            [
                Rotation3::from_euler_angles(0.1, 0.2, 0.3).into_inner(),
                Rotation3::from_euler_angles(-0.2, 0.1, 0.05).into_inner(),
            ],
            [t1, t2],
        )
    }

    fn observe(model: &TrifocalModel, point: &Vector4<f64>) -> [Bearing; NVIEWS] {
        let mut bearings = [Bearing::zeros(); NVIEWS];
        for (v, bearing) in bearings.iter_mut().enumerate() {
            let x = model.camera(v) * point;
            *bearing = Vector4::new(x.x / x.z, x.y / x.z, 1.0, 0.0);
        }
        bearings
    }

    fn k() -> Intrinsics {
        Intrinsics::new(2584.93, 2584.79, 0.0, 249.77, 278.31)
    }

    #[test]
    fn dlt_recovers_point() {
        let model = model(Vector3::new(0.5, -0.2, 0.1), Vector3::new(-0.3, 0.4, 0.2));
        let point = Vector4::new(0.2, 0.1, 4.0, 1.0);
        let b = observe(&model, &point);
        let x = triangulate_dlt(
            model.camera(0),
            &b[0].xy().push(1.0),
            model.camera(1),
            &b[1].xy().push(1.0),
        )
        .expect("svd did not converge");
        assert_relative_eq!(x.xyz() / x.w, point.xyz(), epsilon = 1e-9);
    }

    #[test]
    fn wider_baseline_selects_third_view() {
        let far_1 = model(Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.1, 0.0, 0.0));
        let far_2 = model(Vector3::new(0.1, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0));
        let tie = model(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(third_view(&far_1), 2);
        assert_eq!(third_view(&far_2), 1);
        assert_eq!(third_view(&tie), 1);
    }

    #[test]
    fn consistent_observation_has_no_error() {
        for (t1, t2) in [
            (Vector3::new(0.5, -0.2, 0.1), Vector3::new(-0.3, 0.4, 0.2)),
            (Vector3::new(0.1, -0.1, 0.1), Vector3::new(-0.6, 0.4, 0.2)),
        ] {
            let model = model(t1, t2);
            let b = observe(&model, &Vector4::new(-0.5, 0.3, 5.0, 1.0));
            let e = error(&model, &b, &b, &k());
            assert!(e < 1e-12, "error {}", e);
        }
    }

    #[test]
    fn error_measures_third_view_offset() {
        let model = model(Vector3::new(0.5, -0.2, 0.1), Vector3::new(-0.3, 0.4, 0.2));
        let mut b = observe(&model, &Vector4::new(0.4, -0.6, 3.5, 1.0));
        b[2].x += 0.01;
        b[2].z = 0.7;
        let e = error(&model, &b, &b, &k());
        assert_relative_eq!(e, 1e-4, epsilon = 1e-10);
    }

    #[test]
    fn corrupted_observation_is_never_an_inlier() {
        let model = model(Vector3::new(0.5, -0.2, 0.1), Vector3::new(-0.3, 0.4, 0.2));
        let mut b = observe(&model, &Vector4::new(0.2, 0.1, 4.0, 1.0));
        b[0].x = f64::NAN;
        let e = error(&model, &b, &b, &k());
        assert!(!(e < 1.0), "error {}", e);
    }

    #[quickcheck_macros::quickcheck]
    fn deterministic(offset: (i8, i8), depth: u8) -> bool {
        let model = model(Vector3::new(0.5, -0.2, 0.1), Vector3::new(-0.3, 0.4, 0.2));
        let point = Vector4::new(offset.0 as f64 / 64.0, offset.1 as f64 / 64.0, 2.0, 1.0);
        let mut b = observe(&model, &point);
        b[1].y += depth as f64 / 1000.0;
        let first = error(&model, &b, &b, &k());
        let second = error(&model, &b, &b, &k());
        first >= 0.0 && first.to_bits() == second.to_bits()
    }
}
