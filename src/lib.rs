//! Spot tracking and fluorescence screening for microscopy image stacks.
//!
//! Spots are detected on one channel of a (channel, depth, frame) volume,
//! linked across frames into tracks (with optional splitting), annotated with
//! a fluorescence feature, and screened against a threshold. Fixed regions can
//! also be sampled into per-channel intensity traces.

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod integration;
pub mod screener;
pub mod traces;
pub mod tracker;
pub mod volume;

pub use batch::{BatchDriver, BatchReport, FileOutcome, LoadedImage, Outcome, OutputMode, VolumeLoader};
pub use config::{DetectorKind, PipelineConfig};
pub use error::{ConfigError, Error, Result, VolumeError};
pub use features::{FeatureEvaluator, FeatureKind, SpotFeature, SpotStatistics};
pub use integration::{
    Detector, LocalMaximaDetector, OverlayDetector, Screening, ScreeningPipeline, SpotBuilder,
    SpotDetector,
};
pub use screener::{MaximumScreener, ThresholdScreener, Verdict};
pub use traces::{IntensityTable, extract_traces};
pub use tracker::{Linker, LinkerConfig, Spot, Track, TrackFate, TrackId, TrackSet};
pub use volume::{ImageVolume, PixelStats, Region, Shape, StackVolume, VolumeDims};
