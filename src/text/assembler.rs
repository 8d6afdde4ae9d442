//! Turns unordered character detections from one plate crop into text.
//!
//! Steps: non-max suppression, row segmentation, left-to-right ordering
//! within rows, row join, normalization.

use serde::{Deserialize, Serialize};

use super::{CharacterGlyph, normalize_plate_text, score_plate};
use crate::config::{OcrConfig, RowSegmentation};

/// Glyph counts at or below this are always read as one row.
const SINGLE_ROW_MAX_GLYPHS: usize = 3;

const TWO_MEANS_MAX_ITERATIONS: usize = 20;

/// Text assembled from one plate crop in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateReading {
    /// Normalized text, possibly empty
    pub text: String,
    /// Glyphs the text was assembled from (after label resolution)
    pub glyphs: Vec<CharacterGlyph>,
    /// Quality score, see [`score_plate`]
    pub score: f32,
}

impl PlateReading {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CharacterAssembler {
    nms_iou: f32,
    row_threshold_factor: f32,
    assembly_floor: f32,
    segmentation: RowSegmentation,
    digit_heavy_o_to_zero: bool,
}

impl Default for CharacterAssembler {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl CharacterAssembler {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            nms_iou: config.nms_iou,
            row_threshold_factor: config.row_threshold_factor,
            assembly_floor: config.assembly_floor,
            segmentation: config.row_segmentation,
            digit_heavy_o_to_zero: config.digit_heavy_o_to_zero,
        }
    }

    /// Assemble and score a reading from resolved glyphs.
    pub fn read(&self, glyphs: Vec<CharacterGlyph>) -> PlateReading {
        let text = self.assemble(&glyphs);
        let score = score_plate(&text, &glyphs);
        PlateReading {
            text,
            glyphs,
            score,
        }
    }

    /// Assemble normalized plate text. Empty input gives an empty string.
    pub fn assemble(&self, glyphs: &[CharacterGlyph]) -> String {
        let kept = suppress_overlapping(glyphs, self.nms_iou);
        if kept.is_empty() {
            return String::new();
        }

        let rows = self.segment_rows(kept);
        let lines: Vec<String> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|g| g.confidence() >= self.assembly_floor)
                    .map(|g| g.label)
                    .collect::<String>()
            })
            .filter(|line| !line.is_empty())
            .collect();

        normalize_plate_text(&lines.join(" "), self.digit_heavy_o_to_zero)
    }

    /// Split glyphs into rows ordered top to bottom, each sorted left to right.
    pub fn segment_rows(&self, glyphs: Vec<CharacterGlyph>) -> Vec<Vec<CharacterGlyph>> {
        if glyphs.is_empty() {
            return Vec::new();
        }

        let avg_height = glyphs.iter().map(|g| g.height()).sum::<f32>() / glyphs.len() as f32;
        if avg_height <= 0.0 {
            return Vec::new();
        }

        let mut rows = if glyphs.len() <= SINGLE_ROW_MAX_GLYPHS {
            vec![glyphs]
        } else {
            let threshold = avg_height * self.row_threshold_factor;
            match self.segmentation {
                RowSegmentation::AdjacentGap => split_on_gaps(glyphs, threshold),
                RowSegmentation::TwoCluster => split_two_means(glyphs, threshold),
            }
        };

        for row in &mut rows {
            row.sort_by(|a, b| a.center_x().total_cmp(&b.center_x()).then_with(|| a.tie_break(b)));
        }
        rows
    }
}

/// Greedy non-max suppression, highest confidence first.
pub fn suppress_overlapping(glyphs: &[CharacterGlyph], iou_threshold: f32) -> Vec<CharacterGlyph> {
    let mut sorted = glyphs.to_vec();
    sorted.sort_by(|a, b| {
        b.confidence()
            .total_cmp(&a.confidence())
            .then_with(|| a.tie_break(b))
    });

    let mut suppressed = vec![false; sorted.len()];
    let mut kept = Vec::with_capacity(sorted.len());
    for i in 0..sorted.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(sorted[i]);
        for j in (i + 1)..sorted.len() {
            if !suppressed[j] && sorted[i].bbox().iou(sorted[j].bbox()) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }
    kept
}

fn by_vertical_center(glyphs: &mut [CharacterGlyph]) {
    glyphs.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then_with(|| a.center_x().total_cmp(&b.center_x()))
            .then_with(|| a.tie_break(b))
    });
}

fn split_on_gaps(mut glyphs: Vec<CharacterGlyph>, threshold: f32) -> Vec<Vec<CharacterGlyph>> {
    by_vertical_center(&mut glyphs);

    let mut rows: Vec<Vec<CharacterGlyph>> = Vec::new();
    let mut current: Vec<CharacterGlyph> = Vec::new();
    for glyph in glyphs {
        let starts_row = current
            .last()
            .is_some_and(|prev| (glyph.center_y() - prev.center_y()).abs() >= threshold);
        if starts_row {
            rows.push(std::mem::take(&mut current));
        }
        current.push(glyph);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Two-means on vertical centers. Falls back to a single row when the two
/// centroids are closer than `min_separation`.
fn split_two_means(mut glyphs: Vec<CharacterGlyph>, min_separation: f32) -> Vec<Vec<CharacterGlyph>> {
    by_vertical_center(&mut glyphs);

    let ys: Vec<f32> = glyphs.iter().map(|g| g.center_y()).collect();
    let (mut upper, mut lower) = match (ys.first(), ys.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let mut assignment = vec![false; ys.len()];
    for _ in 0..TWO_MEANS_MAX_ITERATIONS {
        let next: Vec<bool> = ys
            .iter()
            .map(|y| (y - lower).abs() < (y - upper).abs())
            .collect();

        let (mut sum_u, mut n_u, mut sum_l, mut n_l) = (0.0f32, 0usize, 0.0f32, 0usize);
        for (y, is_lower) in ys.iter().zip(&next) {
            if *is_lower {
                sum_l += y;
                n_l += 1;
            } else {
                sum_u += y;
                n_u += 1;
            }
        }
        if n_u == 0 || n_l == 0 {
            return vec![glyphs];
        }

        let converged = next == assignment;
        assignment = next;
        upper = sum_u / n_u as f32;
        lower = sum_l / n_l as f32;
        if converged {
            break;
        }
    }

    if lower - upper < min_separation {
        return vec![glyphs];
    }

    let (bottom, top): (Vec<_>, Vec<_>) = glyphs
        .into_iter()
        .zip(assignment)
        .partition(|(_, is_lower)| *is_lower);
    vec![
        top.into_iter().map(|(g, _)| g).collect(),
        bottom.into_iter().map(|(g, _)| g).collect(),
    ]
}
