//! Builder for creating Spot objects in detector adapters.

use crate::tracker::Spot;

/// Builder for creating `Spot` objects.
#[derive(Debug, Clone)]
pub struct SpotBuilder {
    x: f64,
    y: f64,
    radius: f64,
    frame: usize,
    channel: usize,
    quality: f64,
}

impl Default for SpotBuilder {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            radius: 1.0,
            frame: 0,
            channel: 0,
            quality: 1.0,
        }
    }
}

impl SpotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the center in pixel coordinates (x = column, y = row).
    pub fn center(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the center from a bounding box (x, y, width, height).
    pub fn bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x + width / 2.0;
        self.y = y + height / 2.0;
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn frame(mut self, frame: usize) -> Self {
        self.frame = frame;
        self
    }

    pub fn channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    /// Set the detector confidence.
    pub fn quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn build(self) -> Spot {
        Spot::new(self.x, self.y, self.radius, self.frame, self.channel).with_quality(self.quality)
    }
}
