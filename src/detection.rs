//! Detector output consumed by the engine.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// One detector hit: a box, a confidence and a class id.
///
/// Produced externally for vehicles, plates and characters. Frame-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in TLBR format (x1, y1, x2, y2)
    pub bbox: BBox,
    /// Detection confidence score
    pub score: f32,
    /// Detector class id
    pub class_id: u32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: u32) -> Self {
        Self {
            bbox: BBox::new(x1, y1, x2, y2),
            score,
            class_id,
        }
    }

    pub fn from_bbox(bbox: BBox, score: f32, class_id: u32) -> Self {
        Self {
            bbox,
            score,
            class_id,
        }
    }
}

/// Vehicle and plate detections for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub vehicles: Vec<Detection>,
    pub plates: Vec<Detection>,
}

impl FrameDetections {
    pub fn new(vehicles: Vec<Detection>, plates: Vec<Detection>) -> Self {
        Self { vehicles, plates }
    }

    pub fn plates_only(plates: Vec<Detection>) -> Self {
        Self {
            vehicles: Vec::new(),
            plates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.plates.is_empty()
    }
}
