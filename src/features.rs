// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-view image features feeding the correspondences.
//!
//! Where the features come from (files, a detector, a database) is up to the
//! [`FeatureSource`] implementor. [`FeaturesProvider::load`] queries the source
//! for every view, in parallel with the `rayon` feature, and stops at the
//! first view that fails.

use crate::error::Result;
use log::error;
use nalgebra::DMatrix;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Identifier of a view (image) of a dataset.
pub type ViewId = u32;

/// Position of a detected feature, in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointFeature {
    #[allow(missing_docs)]
    pub x: f32,
    #[allow(missing_docs)]
    pub y: f32,
}

/// Feature with a scale and an orientation in radians.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientedPointFeature {
    #[allow(missing_docs)]
    pub x: f32,
    #[allow(missing_docs)]
    pub y: f32,
    /// Detection scale in pixels.
    pub scale: f32,
    /// Orientation in radians.
    pub orientation: f32,
}

impl From<OrientedPointFeature> for PointFeature {
    fn from(f: OrientedPointFeature) -> Self {
        Self { x: f.x, y: f.y }
    }
}

/// Provides the features detected in one view.
pub trait FeatureSource: Sync {
    /// All features of `view`, or [`crate::Error::FeatureLoad`].
    fn load(&self, view: ViewId) -> Result<Vec<OrientedPointFeature>>;
}

/// Features of a set of views, keyed by view id.
#[derive(Debug, Clone, Default)]
pub struct FeaturesProvider {
    feats_per_view: HashMap<ViewId, Vec<PointFeature>>,
    oriented_feats_per_view: HashMap<ViewId, Vec<OrientedPointFeature>>,
}

impl FeaturesProvider {
    /// Load the features of every view from `source`.
    ///
    /// With `store_oriented` the scale and orientation are kept,
    /// otherwise only positions are.
    /// The first failing view aborts the remaining loads and its error is returned.
    pub fn load<F: FeatureSource>(
        source: &F,
        views: &[ViewId],
        store_oriented: bool,
    ) -> Result<Self> {
        let keep_going = AtomicBool::new(true);
        let provider = Mutex::new(Self::default());
        let first_error = Mutex::new(None);

        let load_view = |&view: &ViewId| {
            if !keep_going.load(Ordering::Acquire) {
                return;
            }
            match source.load(view) {
                Ok(features) => {
                    let mut provider = provider.lock().unwrap_or_else(PoisonError::into_inner);
                    provider.insert(view, features, store_oriented);
                }
                Err(e) => {
                    error!("invalid feature files for view {}: {}", view, e);
                    keep_going.store(false, Ordering::Release);
                    first_error
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get_or_insert(e);
                }
            }
        };

        #[cfg(feature = "rayon")]
        views.par_iter().for_each(load_view);
        #[cfg(not(feature = "rayon"))]
        views.iter().for_each(load_view);

        match first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(e) => Err(e),
            None => Ok(provider.into_inner().unwrap_or_else(PoisonError::into_inner)),
        }
    }

    /// Store the features of one view, replacing previous ones.
    pub fn insert(&mut self, view: ViewId, features: Vec<OrientedPointFeature>, oriented: bool) {
        if oriented {
            self.oriented_feats_per_view.insert(view, features);
        } else {
            self.feats_per_view
                .insert(view, features.into_iter().map(Into::into).collect());
        }
    }

    /// Whether any view was stored with orientations.
    pub fn has_oriented_features(&self) -> bool {
        !self.oriented_feats_per_view.is_empty()
    }

    /// Positions of a view, empty for unknown views.
    pub fn features(&self, view: ViewId) -> &[PointFeature] {
        self.feats_per_view
            .get(&view)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Oriented features of a view, empty for unknown views.
    pub fn oriented_features(&self, view: ViewId) -> &[OrientedPointFeature] {
        self.oriented_feats_per_view
            .get(&view)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pixel correspondence matrix of three oriented features of a view,
    /// one `(x, y, cos θ, sin θ)` column per feature.
    ///
    /// Returns `None` when a feature index is out of range.
    pub fn datum(&self, view: ViewId, ids: [usize; 3]) -> Option<DMatrix<f64>> {
        let features = self.oriented_features(view);
        let mut datum = DMatrix::zeros(4, ids.len());
        for (c, &id) in ids.iter().enumerate() {
            let f = features.get(id)?;
            let orientation = f64::from(f.orientation);
            datum[(0, c)] = f64::from(f.x);
            datum[(1, c)] = f64::from(f.y);
            datum[(2, c)] = orientation.cos();
            datum[(3, c)] = orientation.sin();
        }
        Some(datum)
    }
}
