//! Read-only access to multi-dimensional image stacks.
//!
//! A volume is addressed by (channel, depth, frame); each address resolves to
//! a 2-D plane indexed `[row, col]`.

mod region;
mod shape;
mod stack;

use ndarray::ArrayView2;

use crate::error::VolumeError;

pub use region::Region;
pub use shape::{PixelStats, Shape};
pub use stack::StackVolume;

/// Extent of a volume along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeDims {
    pub channels: usize,
    pub depths: usize,
    pub frames: usize,
    pub height: usize,
    pub width: usize,
}

impl VolumeDims {
    pub fn new(channels: usize, depths: usize, frames: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            depths,
            frames,
            height,
            width,
        }
    }

    pub fn contains_plane(&self, channel: usize, depth: usize, frame: usize) -> bool {
        channel < self.channels && depth < self.depths && frame < self.frames
    }

    pub(crate) fn out_of_range(&self, channel: usize, depth: usize, frame: usize) -> VolumeError {
        VolumeError::PlaneOutOfRange {
            channel,
            depth,
            frame,
            dims: (self.channels, self.depths, self.frames),
        }
    }
}

/// A decoded 4-D image stack. Implementations never mutate pixel data while
/// a pipeline reads from them.
pub trait ImageVolume {
    fn dims(&self) -> VolumeDims;

    fn plane(&self, channel: usize, depth: usize, frame: usize)
    -> Result<ArrayView2<'_, f32>, VolumeError>;

    /// Pixel statistics of one plane restricted to `shape`.
    fn shape_stats(
        &self,
        channel: usize,
        depth: usize,
        frame: usize,
        shape: &Shape,
    ) -> Result<PixelStats, VolumeError> {
        let plane = self.plane(channel, depth, frame)?;
        Ok(shape.stats(&plane))
    }

    /// Unweighted mean intensity of one plane restricted to `shape`.
    fn mean_intensity(
        &self,
        channel: usize,
        depth: usize,
        frame: usize,
        shape: &Shape,
    ) -> Result<f64, VolumeError> {
        Ok(self.shape_stats(channel, depth, frame, shape)?.mean())
    }
}

impl<V: ImageVolume + ?Sized> ImageVolume for &V {
    fn dims(&self) -> VolumeDims {
        (**self).dims()
    }

    fn plane(
        &self,
        channel: usize,
        depth: usize,
        frame: usize,
    ) -> Result<ArrayView2<'_, f32>, VolumeError> {
        (**self).plane(channel, depth, frame)
    }
}
