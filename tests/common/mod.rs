#![allow(dead_code)]

use nalgebra::{DMatrix, Matrix2, Rotation3, Vector2, Vector3, Vector4};
use std::cell::Cell;
use trifocal::model::RelativeCameras;
use trifocal::solver::{PackedCorrespondences, RawSolutions};
use trifocal::{Intrinsics, MinimalSolver, TrifocalModel};

/// Noiseless observations of three oriented 3D points in three views.
pub struct Synthetic {
    pub ground_truth: TrifocalModel,
    pub intrinsics: Intrinsics,
    /// Pixel `(x, y, tangent x, tangent y)`, one column per point.
    pub pixel: [DMatrix<f64>; 3],
    /// Same data in normalized coordinates, with unit tangents.
    pub normalized: [DMatrix<f64>; 3],
}

impl Synthetic {
    pub fn new() -> Self {
        let ground_truth = TrifocalModel::from_parts(
            [
                Rotation3::from_euler_angles(0.02, -0.05, 0.03).into_inner(),
                Rotation3::from_euler_angles(-0.03, 0.06, -0.02).into_inner(),
            ],
            [Vector3::new(-0.4, 0.05, 0.1), Vector3::new(0.35, -0.1, 0.05)],
        );
        let intrinsics = Intrinsics::new(
            2584.932_509_819_501_3,
            2584.791_860_605_769_2,
            0.0,
            249.771_375_872_214_18,
            278.312_679_379_193_5,
        );
        let points = [
            Vector3::new(0.2, 0.1, 4.0),
            Vector3::new(-0.5, 0.3, 5.0),
            Vector3::new(0.4, -0.6, 3.5),
        ];
        let tangents = [
            Vector3::new(1.0, 0.2, 0.1),
            Vector3::new(-0.3, 1.0, 0.2),
            Vector3::new(0.5, 0.5, -0.3),
        ];
        let k = intrinsics.0;
        let k_linear = Matrix2::new(k[0][0], k[0][1], 0.0, k[1][1]);

        let project = |v: usize| {
            let mut datum = DMatrix::zeros(4, 3);
            for (ip, (point, tangent)) in points.iter().zip(&tangents).enumerate() {
                let x = ground_truth.camera(v) * point.push(1.0);
                let d = ground_truth.rotation(v) * tangent;
                let position = Vector2::new(x.x / x.z, x.y / x.z);
                let image_tangent = (d.xy() * x.z - x.xy() * d.z).normalize();
                let pixel = intrinsics.apply(&position);
                let pixel_tangent = k_linear * image_tangent;
                datum[(0, ip)] = pixel.x;
                datum[(1, ip)] = pixel.y;
                datum[(2, ip)] = pixel_tangent.x;
                datum[(3, ip)] = pixel_tangent.y;
            }
            datum
        };
        let pixel = [project(0), project(1), project(2)];
        let normalized = [
            intrinsics.normalize_datum(&pixel[0]),
            intrinsics.normalize_datum(&pixel[1]),
            intrinsics.normalize_datum(&pixel[2]),
        ];

        Self {
            ground_truth,
            intrinsics,
            pixel,
            normalized,
        }
    }

    pub fn datum(&self) -> [&DMatrix<f64>; 3] {
        [&self.normalized[0], &self.normalized[1], &self.normalized[2]]
    }

    /// Normalized observations of one point in every view.
    pub fn bearings(&self, point: usize) -> [Vector4<f64>; 3] {
        column(&self.normalized, point)
    }

    /// Pixel observations of one point in every view.
    pub fn pixel_bearings(&self, point: usize) -> [Vector4<f64>; 3] {
        column(&self.pixel, point)
    }
}

fn column(datum: &[DMatrix<f64>; 3], point: usize) -> [Vector4<f64>; 3] {
    let col = |v: usize| Vector4::from_iterator(datum[v].column(point).iter().copied());
    [col(0), col(1), col(2)]
}

/// Slot of the rescaled ground truth in [`ScriptedSolver`].
pub const GROUND_TRUTH_SLOT: usize = 5;

/// Stands in for the external solver: fails a given number of runs, then
/// returns a fixed set of slots holding the ground truth (rescaled)
/// among spurious solutions.
pub struct ScriptedSolver {
    failures: usize,
    pub calls: Cell<usize>,
    slots: Vec<RelativeCameras>,
    ids: Vec<usize>,
}

impl ScriptedSolver {
    pub fn new(ground_truth: &TrifocalModel, failures: usize) -> Self {
        let spurious = |roll: f64, scale: f64| {
            TrifocalModel::from_parts(
                [
                    Rotation3::from_euler_angles(roll, 0.4, -0.1).into_inner(),
                    ground_truth.rotation(2),
                ],
                [
                    ground_truth.translation(1) * scale,
                    ground_truth.translation(2) * scale,
                ],
            )
            .to_relative()
        };
        let rescaled = TrifocalModel::from_parts(
            [ground_truth.rotation(1), ground_truth.rotation(2)],
            [
                ground_truth.translation(1) * 3.0,
                ground_truth.translation(2) * 3.0,
            ],
        );
        let mirrored = TrifocalModel::from_parts(
            [ground_truth.rotation(1), ground_truth.rotation(2)],
            [-ground_truth.translation(1), -ground_truth.translation(2)],
        );

        let mut slots = vec![[[[0.0; 3]; 4]; 2]; Self::MAX_SOLUTIONS];
        slots[1] = spurious(0.7, 1.0);
        slots[GROUND_TRUTH_SLOT] = rescaled.to_relative();
        slots[6] = mirrored.to_relative();
        slots[7] = spurious(-0.2, 2.0);
        Self {
            failures,
            calls: Cell::new(0),
            slots,
            ids: vec![1, GROUND_TRUTH_SLOT, 6],
        }
    }
}

impl MinimalSolver for ScriptedSolver {
    const MAX_SOLUTIONS: usize = 8;

    fn solve(&self, _: &PackedCorrespondences) -> Option<RawSolutions> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() <= self.failures {
            return None;
        }
        Some(RawSolutions {
            cameras: self.slots.clone(),
            ids: self.ids.clone(),
        })
    }
}
