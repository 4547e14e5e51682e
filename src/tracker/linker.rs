//! Frame-to-frame LAP linker with optional track splitting.

use std::collections::VecDeque;

use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::spot::Spot;
use crate::tracker::track::{Track, TrackId, TrackSet};
use crate::tracker::track_state::TrackFate;

/// Configuration for the [`Linker`].
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    pub max_linking_distance: f64,
    pub allow_splitting: bool,
    pub splitting_max_distance: f64,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            max_linking_distance: 15.0,
            allow_splitting: true,
            splitting_max_distance: 45.0,
        }
    }
}

/// (frame index, spot index within the frame)
type Node = (usize, usize);

struct Pending {
    start: Node,
    /// Split spot of the parent, prepended to the child track
    head: Option<Node>,
    parent: Option<TrackId>,
}

pub struct Linker {
    config: LinkerConfig,
}

impl Linker {
    pub fn new(config: LinkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Link per-frame spot sets (`frames[f]` holds the spots of frame `f`)
    /// into tracks. Frames are processed in increasing order.
    pub fn link(&self, frames: &[Vec<Spot>]) -> TrackSet {
        if frames.iter().all(|f| f.is_empty()) {
            return TrackSet::default();
        }

        let mut successors: Vec<Vec<Vec<usize>>> =
            frames.iter().map(|f| vec![Vec::new(); f.len()]).collect();
        let mut predecessor: Vec<Vec<Option<usize>>> =
            frames.iter().map(|f| vec![None; f.len()]).collect();
        let mut split_in: Vec<Vec<bool>> = frames.iter().map(|f| vec![false; f.len()]).collect();

        // Step 1: frame-to-frame linking
        for f in 0..frames.len().saturating_sub(1) {
            let sources: Vec<&Spot> = frames[f].iter().collect();
            let targets: Vec<&Spot> = frames[f + 1].iter().collect();
            let costs =
                matching::distance_costs(&sources, &targets, self.config.max_linking_distance);

            let AssignmentResult {
                matches,
                unmatched_sources,
                unmatched_targets,
            } = matching::linear_assignment(&costs);

            for &(i, j) in &matches {
                successors[f][i].push(j);
                predecessor[f + 1][j] = Some(i);
            }

            tracing::debug!(
                frame = f,
                links = matches.len(),
                deaths = unmatched_sources.len(),
                births = unmatched_targets.len(),
                "linked frame pair"
            );
        }

        // Step 2: attach segment starts to the middle of other segments
        if self.config.allow_splitting {
            let mut splits = 0;
            for f in 0..frames.len().saturating_sub(1) {
                let orphans: Vec<usize> = (0..frames[f + 1].len())
                    .filter(|&j| predecessor[f + 1][j].is_none())
                    .collect();
                let parents: Vec<usize> = (0..frames[f].len())
                    .filter(|&i| !successors[f][i].is_empty())
                    .collect();
                if orphans.is_empty() || parents.is_empty() {
                    continue;
                }

                let orphan_spots: Vec<&Spot> = orphans.iter().map(|&j| &frames[f + 1][j]).collect();
                let parent_spots: Vec<&Spot> = parents.iter().map(|&i| &frames[f][i]).collect();
                let costs = matching::distance_costs(
                    &orphan_spots,
                    &parent_spots,
                    self.config.splitting_max_distance,
                );

                for (o, p) in matching::linear_assignment(&costs).matches {
                    let (child, parent) = (orphans[o], parents[p]);
                    successors[f][parent].push(child);
                    successors[f][parent].sort_unstable();
                    predecessor[f + 1][child] = Some(parent);
                    split_in[f + 1][child] = true;
                    splits += 1;
                }
            }
            tracing::debug!(splits, "split pass done");
        }

        // Step 3: decompose the link graph into tracks
        let last_frame = frames.len() - 1;
        let mut pending: VecDeque<Pending> = VecDeque::new();
        for (f, frame) in frames.iter().enumerate() {
            for i in 0..frame.len() {
                if predecessor[f][i].is_none() {
                    pending.push_back(Pending {
                        start: (f, i),
                        head: None,
                        parent: None,
                    });
                }
            }
        }

        let mut tracks: Vec<Track> = Vec::new();
        while let Some(Pending {
            start,
            head,
            parent,
        }) = pending.pop_front()
        {
            let id = tracks.len();
            let mut spots = Vec::new();
            if let Some((hf, hi)) = head {
                spots.push(frames[hf][hi].clone());
            }

            let (mut f, mut i) = start;
            let fate = loop {
                spots.push(frames[f][i].clone());
                let next = &successors[f][i];
                match next.len() {
                    0 if f == last_frame => break TrackFate::Open,
                    0 => break TrackFate::Died,
                    1 => i = next[0],
                    _ => {
                        for &child in next {
                            pending.push_back(Pending {
                                start: (f + 1, child),
                                head: Some((f, i)),
                                parent: Some(id),
                            });
                        }
                        break TrackFate::Split;
                    }
                }
                f += 1;
            };

            if let Some(parent) = parent {
                tracks[parent].children.push(id);
            }
            tracks.push(Track {
                id,
                spots,
                parent,
                children: Vec::new(),
                split_from: head.is_some() && split_in[start.0][start.1],
                fate,
            });
        }

        tracing::debug!(tracks = tracks.len(), "linking done");
        TrackSet::new(tracks)
    }
}
