use crate::volume::Shape;

/// A pre-drawn region of interest.
///
/// `frame` is the anchor frame the outline was drawn on. Trace extraction
/// samples every frame with the same outline regardless of the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub shape: Shape,
    /// `None` when the region applies to every channel.
    pub channel: Option<usize>,
    pub depth: usize,
    pub frame: usize,
}

impl Region {
    pub fn new(shape: Shape, channel: Option<usize>, depth: usize, frame: usize) -> Self {
        Self {
            shape,
            channel,
            depth,
            frame,
        }
    }

    /// Region at `depth` anchored on `frame`, valid for every channel.
    pub fn at(shape: Shape, depth: usize, frame: usize) -> Self {
        Self::new(shape, None, depth, frame)
    }

    pub fn applies_to_channel(&self, channel: usize) -> bool {
        self.channel.is_none_or(|c| c == channel)
    }
}
