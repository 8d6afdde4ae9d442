//! Single plate track driven by the Kalman filter.

use crate::geometry::BBox;
use crate::tracker::kalman_filter::{KalmanFilter, KalmanState};
use crate::tracker::track_state::TrackState;

#[derive(Debug, Clone)]
pub struct PlateTrack {
    /// Identifier, unique within the owning resolver
    pub track_id: u64,
    pub state: TrackState,
    /// Consecutive frames without a matching detection
    pub misses: u32,
    /// Total matched frames
    pub hits: u32,
    kalman: KalmanState,
    last_box: BBox,
}

fn xyah_f64(bbox: &BBox) -> [f64; 4] {
    bbox.to_xyah().map(|v| v as f64)
}

impl PlateTrack {
    pub fn new(track_id: u64, bbox: BBox, kalman_filter: &KalmanFilter) -> Self {
        Self {
            track_id,
            state: TrackState::New,
            misses: 0,
            hits: 1,
            kalman: kalman_filter.initiate(xyah_f64(&bbox)),
            last_box: bbox,
        }
    }

    /// Box predicted by the filter, or the last observed box when the
    /// prediction has collapsed.
    pub fn predicted_box(&self) -> BBox {
        let [cx, cy, aspect, h] = self.kalman.xyah();
        if h > 0.0 && aspect > 0.0 {
            BBox::from_xyah(cx, cy, aspect, h)
        } else {
            self.last_box
        }
    }

    pub fn last_box(&self) -> BBox {
        self.last_box
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if self.state != TrackState::Tracked {
            // freeze height velocity while unobserved
            self.kalman.mean[7] = 0.0;
        }
        kalman_filter.predict(&mut self.kalman);
    }

    pub fn update(&mut self, bbox: BBox, kalman_filter: &KalmanFilter) {
        if !kalman_filter.update(&mut self.kalman, xyah_f64(&bbox)) {
            self.kalman = kalman_filter.initiate(xyah_f64(&bbox));
        }
        self.last_box = bbox;
        self.state = TrackState::Tracked;
        self.misses = 0;
        self.hits += 1;
    }

    pub fn mark_missed(&mut self) {
        self.state = TrackState::Lost;
        self.misses += 1;
    }
}
