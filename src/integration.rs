//! Integration module for connecting spot detectors with the linker.
//!
//! This module provides the detector capability trait, the built-in
//! detectors, and the pipeline that turns one image volume into a verdict.

mod builder;
mod detector;
mod pipeline;

pub use builder::SpotBuilder;
pub use detector::{Detector, LocalMaximaDetector, OverlayDetector, SpotDetector};
pub use pipeline::{Screening, ScreeningPipeline};
