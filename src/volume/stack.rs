//! In-memory image stack backed by a 5-D ndarray.

use ndarray::{Array2, Array5, ArrayView2, s};

use crate::error::VolumeError;
use crate::volume::{ImageVolume, VolumeDims};

/// Pixel stack with axes (channel, depth, frame, row, col).
#[derive(Debug, Clone)]
pub struct StackVolume {
    data: Array5<f32>,
}

impl StackVolume {
    pub fn new(data: Array5<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(dims: VolumeDims) -> Self {
        Self::new(Array5::zeros(shape_of(dims)))
    }

    /// Build from a flat buffer laid out channel-major, then depth, frame, row, col.
    pub fn from_shape_vec(dims: VolumeDims, pixels: Vec<f32>) -> Result<Self, VolumeError> {
        let shape = shape_of(dims);
        let actual = pixels.len();
        Array5::from_shape_vec(shape, pixels)
            .map(Self::new)
            .map_err(|_| VolumeError::ShapeMismatch {
                expected: vec![shape.0, shape.1, shape.2, shape.3, shape.4],
                actual,
            })
    }

    /// Build by evaluating `f(channel, depth, frame, row, col)` for every pixel.
    pub fn from_fn<F>(dims: VolumeDims, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize, usize, usize) -> f32,
    {
        Self::new(Array5::from_shape_fn(shape_of(dims), |(c, z, t, row, col)| {
            f(c, z, t, row, col)
        }))
    }

    /// Overwrite one plane. Only meant for assembling a stack before it is read.
    pub fn set_plane(
        &mut self,
        channel: usize,
        depth: usize,
        frame: usize,
        plane: &Array2<f32>,
    ) -> Result<(), VolumeError> {
        let dims = self.dims();
        if !dims.contains_plane(channel, depth, frame) {
            return Err(dims.out_of_range(channel, depth, frame));
        }
        if plane.dim() != (dims.height, dims.width) {
            return Err(VolumeError::ShapeMismatch {
                expected: vec![dims.height, dims.width],
                actual: plane.len(),
            });
        }
        self.data
            .slice_mut(s![channel, depth, frame, .., ..])
            .assign(plane);
        Ok(())
    }
}

impl ImageVolume for StackVolume {
    fn dims(&self) -> VolumeDims {
        let (channels, depths, frames, height, width) = self.data.dim();
        VolumeDims::new(channels, depths, frames, height, width)
    }

    fn plane(
        &self,
        channel: usize,
        depth: usize,
        frame: usize,
    ) -> Result<ArrayView2<'_, f32>, VolumeError> {
        let dims = self.dims();
        if !dims.contains_plane(channel, depth, frame) {
            return Err(dims.out_of_range(channel, depth, frame));
        }
        Ok(self.data.slice(s![channel, depth, frame, .., ..]))
    }
}

fn shape_of(dims: VolumeDims) -> (usize, usize, usize, usize, usize) {
    (
        dims.channels,
        dims.depths,
        dims.frames,
        dims.height,
        dims.width,
    )
}
