use nalgebra::{Point2, distance};

use crate::volume::Shape;

/// A point-like object detected in a single plane.
///
/// Spots are immutable once created; [`Spot::with_intensity`] returns an
/// annotated copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    /// Center in pixel coordinates (x = column, y = row).
    pub position: Point2<f64>,
    pub radius: f64,
    pub frame: usize,
    pub channel: usize,
    /// Detector confidence.
    pub quality: f64,
    /// Fluorescence feature, filled in by the feature evaluator.
    pub intensity: Option<f64>,
}

impl Spot {
    pub fn new(x: f64, y: f64, radius: f64, frame: usize, channel: usize) -> Self {
        Self {
            position: Point2::new(x, y),
            radius,
            frame,
            channel,
            quality: 1.0,
            intensity: None,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    #[inline]
    pub fn distance(&self, other: &Spot) -> f64 {
        distance(&self.position, &other.position)
    }

    #[inline]
    pub fn squared_distance(&self, other: &Spot) -> f64 {
        nalgebra::distance_squared(&self.position, &other.position)
    }

    /// The disk covered by the spot.
    pub fn disk(&self) -> Shape {
        Shape::Disk {
            center: self.position,
            radius: self.radius,
        }
    }

    pub fn with_intensity(&self, intensity: f64) -> Self {
        Self {
            intensity: Some(intensity),
            ..self.clone()
        }
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }
}
