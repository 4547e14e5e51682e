//! Spot detectors.

use ndarray::ArrayView2;

use crate::config::DetectorKind;
use crate::error::VolumeError;
use crate::integration::SpotBuilder;
use crate::tracker::Spot;
use crate::volume::Region;

/// Turns one plane into candidate spots.
///
/// Detectors are stateless between calls: the same plane always gives the
/// same spots, in any call order.
///
/// # Example
///
/// ```ignore
/// use fluotrack::{SpotDetector, Spot};
///
/// struct Fixed;
///
/// impl SpotDetector for Fixed {
///     fn detect(&self, plane: ArrayView2<'_, f32>, frame: usize, channel: usize)
///         -> Result<Vec<Spot>, VolumeError> {
///         Ok(vec![Spot::new(10.0, 10.0, 3.0, frame, channel)])
///     }
/// }
/// ```
pub trait SpotDetector {
    fn detect(
        &self,
        plane: ArrayView2<'_, f32>,
        frame: usize,
        channel: usize,
    ) -> Result<Vec<Spot>, VolumeError>;
}

/// Emits one spot per pre-drawn region anchored on the frame.
///
/// Rectangular regions are skipped; they are display overlays, not outlines.
#[derive(Debug, Clone)]
pub struct OverlayDetector {
    regions: Vec<Region>,
    radius: f64,
}

impl OverlayDetector {
    pub fn new(regions: Vec<Region>, radius: f64) -> Self {
        Self { regions, radius }
    }
}

impl SpotDetector for OverlayDetector {
    fn detect(
        &self,
        _plane: ArrayView2<'_, f32>,
        frame: usize,
        channel: usize,
    ) -> Result<Vec<Spot>, VolumeError> {
        Ok(self
            .regions
            .iter()
            .filter(|r| r.frame == frame && r.applies_to_channel(channel))
            .filter(|r| !r.shape.is_rectangle())
            .map(|r| {
                let c = r.shape.centroid();
                SpotBuilder::new()
                    .center(c.x, c.y)
                    .radius(self.radius)
                    .frame(frame)
                    .channel(channel)
                    .build()
            })
            .collect())
    }
}

/// Pixels above `threshold` that are the maximum of their disk neighborhood.
///
/// Ties inside a neighborhood go to the first pixel in row-major order.
#[derive(Debug, Clone)]
pub struct LocalMaximaDetector {
    radius: f64,
    threshold: f32,
}

impl LocalMaximaDetector {
    pub fn new(radius: f64, threshold: f32) -> Self {
        Self { radius, threshold }
    }

    fn is_local_max(&self, plane: &ArrayView2<'_, f32>, row: usize, col: usize) -> bool {
        let (height, width) = plane.dim();
        let value = plane[[row, col]];
        let reach = self.radius.ceil().max(1.0) as usize;
        let r2 = self.radius.max(1.0).powi(2);

        for nr in row.saturating_sub(reach)..=(row + reach).min(height - 1) {
            for nc in col.saturating_sub(reach)..=(col + reach).min(width - 1) {
                if (nr, nc) == (row, col) {
                    continue;
                }
                let dr = nr as f64 - row as f64;
                let dc = nc as f64 - col as f64;
                if dr * dr + dc * dc > r2 {
                    continue;
                }
                let other = plane[[nr, nc]];
                let earlier = (nr, nc) < (row, col);
                if other > value || (other == value && earlier) {
                    return false;
                }
            }
        }
        true
    }
}

impl SpotDetector for LocalMaximaDetector {
    fn detect(
        &self,
        plane: ArrayView2<'_, f32>,
        frame: usize,
        channel: usize,
    ) -> Result<Vec<Spot>, VolumeError> {
        let mut spots = Vec::new();
        for ((row, col), &value) in plane.indexed_iter() {
            if value <= self.threshold || !self.is_local_max(&plane, row, col) {
                continue;
            }
            spots.push(
                SpotBuilder::new()
                    .center(col as f64, row as f64)
                    .radius(self.radius)
                    .frame(frame)
                    .channel(channel)
                    .quality(value as f64)
                    .build(),
            );
        }
        Ok(spots)
    }
}

/// The closed set of detectors selectable from configuration.
#[derive(Debug, Clone)]
pub enum Detector {
    Overlay(OverlayDetector),
    LocalMaxima(LocalMaximaDetector),
}

impl Detector {
    /// Build the configured detector. `overlay` holds the image's pre-drawn
    /// regions and is only used by [`DetectorKind::Overlay`].
    pub fn from_kind(kind: DetectorKind, radius: f64, overlay: &[Region]) -> Self {
        match kind {
            DetectorKind::Overlay => Detector::Overlay(OverlayDetector::new(overlay.to_vec(), radius)),
            DetectorKind::LocalMaxima { threshold } => {
                Detector::LocalMaxima(LocalMaximaDetector::new(radius, threshold))
            }
        }
    }
}

impl SpotDetector for Detector {
    fn detect(
        &self,
        plane: ArrayView2<'_, f32>,
        frame: usize,
        channel: usize,
    ) -> Result<Vec<Spot>, VolumeError> {
        match self {
            Detector::Overlay(d) => d.detect(plane, frame, channel),
            Detector::LocalMaxima(d) => d.detect(plane, frame, channel),
        }
    }
}
