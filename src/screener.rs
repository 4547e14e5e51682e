//! Verdicts over annotated track sets.

use crate::tracker::TrackSet;

/// Outcome of screening one image volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub source: String,
    pub threshold_exceeded: bool,
}

/// Flags an image when any spot in any track reaches the threshold.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdScreener {
    threshold: f64,
}

impl ThresholdScreener {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff some spot's intensity is `>=` the threshold. Spots without an
    /// intensity never qualify; an empty set is always false.
    pub fn exceeds(&self, tracks: &TrackSet) -> bool {
        tracks
            .spots()
            .filter_map(|s| s.intensity)
            .any(|v| v >= self.threshold)
    }

    pub fn screen(&self, source: impl Into<String>, tracks: &TrackSet) -> Verdict {
        Verdict {
            source: source.into(),
            threshold_exceeded: self.exceeds(tracks),
        }
    }
}

/// Maximum fluorescence observed per track and overall.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumScreener;

impl MaximumScreener {
    /// `(track id, max intensity)` for every track with at least one annotated spot.
    pub fn per_track(&self, tracks: &TrackSet) -> Vec<(usize, f64)> {
        tracks
            .iter()
            .filter_map(|t| t.max_intensity().map(|m| (t.id, m)))
            .collect()
    }

    pub fn overall(&self, tracks: &TrackSet) -> Option<f64> {
        self.per_track(tracks)
            .into_iter()
            .map(|(_, m)| m)
            .reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Linker, LinkerConfig, Spot};

    fn annotated(intensities: &[f64]) -> TrackSet {
        let frames: Vec<Vec<Spot>> = intensities
            .iter()
            .enumerate()
            .map(|(f, &v)| vec![Spot::new(10.0, 10.0, 2.0, f, 0).with_intensity(v)])
            .collect();
        Linker::new(LinkerConfig::default()).link(&frames)
    }

    #[test]
    fn test_empty_set_is_false() {
        let screener = ThresholdScreener::new(0.0);
        assert!(!screener.exceeds(&TrackSet::default()));
        assert_eq!(MaximumScreener.overall(&TrackSet::default()), None);
    }

    #[test]
    fn test_below_threshold() {
        let tracks = annotated(&[100.0, 549.9, 300.0]);
        let verdict = ThresholdScreener::new(550.0).screen("a_rois.tif", &tracks);
        assert!(!verdict.threshold_exceeded);
        assert_eq!(verdict.source, "a_rois.tif");
    }

    #[test]
    fn test_one_spot_exceeds() {
        let tracks = annotated(&[100.0, 551.0, 300.0]);
        assert!(ThresholdScreener::new(550.0).exceeds(&tracks));
    }

    #[test]
    fn test_equal_counts_as_exceeded() {
        let tracks = annotated(&[550.0]);
        assert!(ThresholdScreener::new(550.0).exceeds(&tracks));
    }

    #[test]
    fn test_threshold_monotonicity() {
        let tracks = annotated(&[12.0, 480.0, 530.5, 77.0]);
        let thresholds = [0.0, 100.0, 480.0, 500.0, 530.5, 531.0, 1000.0];
        for pair in thresholds.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            if ThresholdScreener::new(high).exceeds(&tracks) {
                assert!(ThresholdScreener::new(low).exceeds(&tracks));
            }
        }
    }

    #[test]
    fn test_maximum() {
        let tracks = annotated(&[12.0, 480.0, 77.0]);
        assert_eq!(MaximumScreener.overall(&tracks), Some(480.0));
        assert_eq!(MaximumScreener.per_track(&tracks), vec![(0, 480.0)]);
    }
}
