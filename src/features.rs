//! Per-spot fluorescence features sampled from the image volume.

use serde::{Deserialize, Serialize};

use crate::error::VolumeError;
use crate::tracker::{Spot, TrackSet};
use crate::volume::ImageVolume;

/// Scalar feature stored as a spot's intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKind {
    /// Unweighted mean of the pixels inside the spot disk
    #[default]
    MeanIntensity,
    /// Sum of the pixels inside the spot disk
    TotalIntensity,
}

/// Capability to turn one spot into a scalar feature.
pub trait SpotFeature {
    fn evaluate(&self, spot: &Spot, volume: &dyn ImageVolume) -> Result<f64, VolumeError>;
}

/// Fluorescence statistics of the pixels inside a spot disk.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpotStatistics {
    pub pixels: usize,
    pub total: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Samples a fixed (channel, depth) of the volume at each spot's frame.
///
/// A volume without the fluorescence channel is sampled on the spot's own
/// channel instead.
#[derive(Debug, Clone)]
pub struct FeatureEvaluator {
    kind: FeatureKind,
    channel: usize,
    depth: usize,
}

impl FeatureEvaluator {
    pub fn new(kind: FeatureKind, channel: usize, depth: usize) -> Self {
        Self {
            kind,
            channel,
            depth,
        }
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn statistics(
        &self,
        spot: &Spot,
        volume: &dyn ImageVolume,
    ) -> Result<SpotStatistics, VolumeError> {
        let channel = if self.channel < volume.dims().channels {
            self.channel
        } else {
            spot.channel
        };
        let stats = volume.shape_stats(channel, self.depth, spot.frame, &spot.disk())?;
        Ok(SpotStatistics {
            pixels: stats.count,
            total: stats.sum,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        })
    }

    /// A copy of `tracks` whose spots carry this evaluator's feature as intensity.
    pub fn annotate(
        &self,
        tracks: &TrackSet,
        volume: &dyn ImageVolume,
    ) -> Result<TrackSet, VolumeError> {
        tracks.map_spots(|spot| Ok(spot.with_intensity(self.evaluate(spot, volume)?)))
    }
}

impl SpotFeature for FeatureEvaluator {
    fn evaluate(&self, spot: &Spot, volume: &dyn ImageVolume) -> Result<f64, VolumeError> {
        let stats = self.statistics(spot, volume)?;
        Ok(match self.kind {
            FeatureKind::MeanIntensity => stats.mean,
            FeatureKind::TotalIntensity => stats.total,
        })
    }
}
