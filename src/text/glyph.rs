use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::geometry::BBox;

/// A character detection with its resolved label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterGlyph {
    pub detection: Detection,
    pub label: char,
}

impl CharacterGlyph {
    pub fn new(detection: Detection, label: char) -> Self {
        Self { detection, label }
    }

    #[inline]
    pub fn bbox(&self) -> &BBox {
        &self.detection.bbox
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.detection.score
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.detection.bbox.center().0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.detection.bbox.center().1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.detection.bbox.height()
    }

    /// Total order on geometry and label, used to break ties so that
    /// sorting never depends on input order.
    pub(crate) fn tie_break(&self, other: &Self) -> Ordering {
        let a = self.bbox();
        let b = other.bbox();
        a.x1.total_cmp(&b.x1)
            .then_with(|| a.y1.total_cmp(&b.y1))
            .then_with(|| a.x2.total_cmp(&b.x2))
            .then_with(|| a.y2.total_cmp(&b.y2))
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.confidence().total_cmp(&other.confidence()))
    }
}

/// Maps recognizer class ids to characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    symbols: Vec<char>,
}

impl CharacterSet {
    pub fn new(symbols: &str) -> Self {
        Self {
            symbols: symbols.chars().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn label(&self, class_id: u32) -> Option<char> {
        self.symbols.get(class_id as usize).copied()
    }

    /// Resolve labels for character detections at or above `min_confidence`.
    ///
    /// Detections whose class id is outside the vocabulary are dropped.
    pub fn resolve(&self, detections: &[Detection], min_confidence: f32) -> Vec<CharacterGlyph> {
        detections
            .iter()
            .filter(|d| d.score >= min_confidence)
            .filter_map(|d| match self.label(d.class_id) {
                Some(label) => Some(CharacterGlyph::new(*d, label)),
                None => {
                    tracing::debug!(class_id = d.class_id, "dropping glyph with unknown class id");
                    None
                }
            })
            .collect()
    }
}

impl Default for CharacterSet {
    fn default() -> Self {
        Self::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ")
    }
}
