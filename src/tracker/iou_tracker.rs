//! Identity from an IoU-matching Kalman tracker.
//!
//! Drop-in replacement for the grid key when plates move across grid
//! cells or several plates share one.

use crate::config::KeyingConfig;
use crate::geometry::BBox;
use crate::tracker::identity::{IdentityResolver, ObjectKey};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, Assignment};
use crate::tracker::plate_track::PlateTrack;

pub struct TrackerKeyResolver {
    tracks: Vec<PlateTrack>,
    next_id: u64,
    min_iou: f32,
    max_misses: u32,
    kalman_filter: KalmanFilter,
}

impl Default for TrackerKeyResolver {
    fn default() -> Self {
        Self::new(&KeyingConfig::default())
    }
}

impl TrackerKeyResolver {
    pub fn new(config: &KeyingConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 0,
            min_iou: config.track_min_iou,
            max_misses: config.track_max_misses,
            kalman_filter: KalmanFilter::default(),
        }
    }

    /// Tracks currently alive (matched or within the miss budget).
    pub fn tracks(&self) -> &[PlateTrack] {
        &self.tracks
    }

    fn next_track_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl IdentityResolver for TrackerKeyResolver {
    fn resolve(&mut self, boxes: &[BBox]) -> Vec<ObjectKey> {
        for track in &mut self.tracks {
            track.predict(&self.kalman_filter);
        }

        let predicted: Vec<BBox> = self.tracks.iter().map(|t| t.predicted_box()).collect();
        let cost = matching::iou_distance(&predicted, boxes);
        let Assignment {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&cost, 1.0 - self.min_iou);

        let mut keys = vec![None; boxes.len()];
        for (itrack, idet) in matches {
            let track = &mut self.tracks[itrack];
            track.update(boxes[idet], &self.kalman_filter);
            keys[idet] = Some(ObjectKey::Track(track.track_id));
        }
        for itrack in unmatched_tracks {
            self.tracks[itrack].mark_missed();
        }
        for idet in unmatched_detections {
            let id = self.next_track_id();
            self.tracks.push(PlateTrack::new(id, boxes[idet], &self.kalman_filter));
            keys[idet] = Some(ObjectKey::Track(id));
            tracing::debug!(track_id = id, "new plate track");
        }

        let max_misses = self.max_misses;
        self.tracks.retain(|t| t.misses <= max_misses);

        keys.into_iter()
            .map(|k| k.unwrap_or(ObjectKey::Track(0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_persists_while_moving() {
        let mut resolver = TrackerKeyResolver::default();
        let first = resolver.resolve(&[BBox::new(100.0, 100.0, 180.0, 130.0)]);
        let mut last = first.clone();
        for step in 1..10 {
            let dx = step as f32 * 8.0;
            last = resolver.resolve(&[BBox::new(100.0 + dx, 100.0, 180.0 + dx, 130.0)]);
        }
        assert_eq!(first, last);
    }

    #[test]
    fn test_distinct_plates_get_distinct_ids() {
        let mut resolver = TrackerKeyResolver::default();
        let keys = resolver.resolve(&[
            BBox::new(0.0, 0.0, 80.0, 30.0),
            BBox::new(300.0, 0.0, 380.0, 30.0),
        ]);
        assert_ne!(keys[0], keys[1]);
        let again = resolver.resolve(&[
            BBox::new(302.0, 0.0, 382.0, 30.0),
            BBox::new(2.0, 0.0, 82.0, 30.0),
        ]);
        assert_eq!(again, vec![keys[1], keys[0]]);
    }

    #[test]
    fn test_track_dropped_after_miss_budget() {
        let config = KeyingConfig {
            track_max_misses: 2,
            ..KeyingConfig::default()
        };
        let mut resolver = TrackerKeyResolver::new(&config);
        let first = resolver.resolve(&[BBox::new(0.0, 0.0, 80.0, 30.0)]);
        for _ in 0..3 {
            resolver.resolve(&[]);
        }
        assert!(resolver.tracks().is_empty());
        let later = resolver.resolve(&[BBox::new(0.0, 0.0, 80.0, 30.0)]);
        assert_ne!(first, later);
    }

    #[test]
    fn test_short_gap_keeps_id() {
        let mut resolver = TrackerKeyResolver::default();
        let first = resolver.resolve(&[BBox::new(0.0, 0.0, 80.0, 30.0)]);
        resolver.resolve(&[]);
        resolver.resolve(&[]);
        let later = resolver.resolve(&[BBox::new(1.0, 0.0, 81.0, 30.0)]);
        assert_eq!(first, later);
    }
}
