/// How a track ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackFate {
    /// No spot in the next frame continues the track
    #[default]
    Died,
    /// The last spot branches into two or more child tracks
    Split,
    /// The track reaches the last frame of the sequence
    Open,
}
