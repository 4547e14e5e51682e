//! ScreeningPipeline for combining detection, linking and screening.

use crate::config::PipelineConfig;
use crate::error::{ConfigError, VolumeError};
use crate::features::FeatureEvaluator;
use crate::screener::{ThresholdScreener, Verdict};
use crate::tracker::{Linker, Spot, TrackSet};
use crate::volume::ImageVolume;

use super::SpotDetector;

/// Annotated tracks and the verdict for one image volume.
#[derive(Debug, Clone)]
pub struct Screening {
    pub tracks: TrackSet,
    pub verdict: Verdict,
}

/// Runs detection on every frame of one channel, links the spots, measures
/// their fluorescence and screens them against the threshold.
///
/// Holds no per-volume state: one pipeline can screen any number of
/// volumes, and the same volume always gives the same result.
pub struct ScreeningPipeline<D: SpotDetector> {
    detector: D,
    linker: Linker,
    evaluator: FeatureEvaluator,
    screener: ThresholdScreener,
    target_channel: usize,
    target_depth: usize,
}

impl<D: SpotDetector> ScreeningPipeline<D> {
    /// Create a pipeline; the configuration is validated first.
    pub fn new(detector: D, config: &PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector,
            linker: Linker::new(config.linker_config()),
            evaluator: FeatureEvaluator::new(
                config.feature,
                config.fluorescence_channel,
                config.target_depth,
            ),
            screener: ThresholdScreener::new(config.fluorescence_threshold),
            target_channel: config.target_channel,
            target_depth: config.target_depth,
        })
    }

    /// Per-frame spot sets of the target channel, in frame order.
    pub fn detect(&self, volume: &dyn ImageVolume) -> Result<Vec<Vec<Spot>>, VolumeError> {
        (0..volume.dims().frames)
            .map(|t| {
                let plane = volume.plane(self.target_channel, self.target_depth, t)?;
                self.detector.detect(plane, t, self.target_channel)
            })
            .collect()
    }

    /// Detected and linked, but not yet annotated, tracks.
    pub fn track(&self, volume: &dyn ImageVolume) -> Result<TrackSet, VolumeError> {
        let frames = self.detect(volume)?;
        Ok(self.linker.link(&frames))
    }

    pub fn process(
        &self,
        volume: &dyn ImageVolume,
        source: impl Into<String>,
    ) -> Result<Screening, VolumeError> {
        let tracks = self.track(volume)?;
        let tracks = self.evaluator.annotate(&tracks, volume)?;
        let verdict = self.screener.screen(source, &tracks);
        Ok(Screening { tracks, verdict })
    }

    pub fn screen(
        &self,
        volume: &dyn ImageVolume,
        source: impl Into<String>,
    ) -> Result<Verdict, VolumeError> {
        Ok(self.process(volume, source)?.verdict)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    pub fn evaluator(&self) -> &FeatureEvaluator {
        &self.evaluator
    }

    pub fn screener(&self) -> &ThresholdScreener {
        &self.screener
    }
}
