//! Tracks and track sets produced by the linker.

use crate::tracker::spot::Spot;
use crate::tracker::track_state::TrackFate;

pub type TrackId = usize;

/// A temporally ordered chain of spots, one per frame in its span.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Stable identifier, deterministic for a given input
    pub id: TrackId,
    pub spots: Vec<Spot>,
    /// Track this one split off from; its last spot is our first spot
    pub parent: Option<TrackId>,
    pub children: Vec<TrackId>,
    /// Whether the link `spots[0] -> spots[1]` is a split link, bounded by
    /// the splitting distance instead of the linking distance
    pub split_from: bool,
    pub fate: TrackFate,
}

impl Track {
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    pub fn start_frame(&self) -> Option<usize> {
        self.spots.first().map(|s| s.frame)
    }

    pub fn end_frame(&self) -> Option<usize> {
        self.spots.last().map(|s| s.frame)
    }

    /// Consecutive spot pairs, with a flag marking the split link.
    pub fn links(&self) -> impl Iterator<Item = (&Spot, &Spot, bool)> {
        self.spots
            .windows(2)
            .enumerate()
            .map(|(i, w)| (&w[0], &w[1], i == 0 && self.split_from))
    }

    /// Largest annotated intensity along the track.
    pub fn max_intensity(&self) -> Option<f64> {
        self.spots
            .iter()
            .filter_map(|s| s.intensity)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// Immutable set of tracks for one image volume, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub(crate) fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id).filter(|t| t.id == id)
    }

    pub fn as_slice(&self) -> &[Track] {
        &self.tracks
    }

    /// Every spot of every track. Split spots are shared by the parent and
    /// its children and therefore appear more than once.
    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.tracks.iter().flat_map(|t| t.spots.iter())
    }

    /// A new set with every spot replaced by `f(spot)`; topology is kept.
    pub fn map_spots<F, E>(&self, mut f: F) -> Result<TrackSet, E>
    where
        F: FnMut(&Spot) -> Result<Spot, E>,
    {
        let tracks = self
            .tracks
            .iter()
            .map(|t| {
                let spots = t.spots.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
                Ok(Track {
                    spots,
                    children: t.children.clone(),
                    ..*t
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(TrackSet { tracks })
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
