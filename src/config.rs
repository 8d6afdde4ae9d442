//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StabilizerError};

/// Top-level configuration for [`StabilizationEngine`](crate::StabilizationEngine)
/// and the pipelines built around it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detection: DetectionConfig,
    pub ocr: OcrConfig,
    pub normalizer: NormalizerConfig,
    pub keying: KeyingConfig,
    pub voter: VoterConfig,
    pub smoother: SmootherConfig,
    pub lock: LockConfig,
    pub retention: RetentionConfig,
    pub preview: PreviewConfig,
    pub burst: BurstConfig,
    pub pipeline: PipelineConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Reject values that would make the engine misbehave silently.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f32| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(StabilizerError::invalid_config(format!(
                    "{name} must be within [0, 1], got {v}"
                )))
            }
        };
        let positive = |name: &str, v: u64| -> Result<()> {
            if v > 0 {
                Ok(())
            } else {
                Err(StabilizerError::invalid_config(format!(
                    "{name} must be positive"
                )))
            }
        };

        unit("detection.vehicle_min_confidence", self.detection.vehicle_min_confidence)?;
        unit("detection.plate_min_confidence", self.detection.plate_min_confidence)?;
        unit("ocr.char_confidence", self.ocr.char_confidence)?;
        unit("ocr.assembly_floor", self.ocr.assembly_floor)?;
        unit("ocr.nms_iou", self.ocr.nms_iou)?;
        unit("normalizer.min_contour_fraction", self.normalizer.min_contour_fraction)?;
        unit("keying.track_min_iou", self.keying.track_min_iou)?;
        unit("burst.plate_confidence_weight", self.burst.plate_confidence_weight)?;

        if !(self.smoother.alpha > 0.0 && self.smoother.alpha <= 1.0) {
            return Err(StabilizerError::invalid_config(format!(
                "smoother.alpha must be within (0, 1], got {}",
                self.smoother.alpha
            )));
        }
        if self.ocr.row_threshold_factor <= 0.0 {
            return Err(StabilizerError::invalid_config(
                "ocr.row_threshold_factor must be positive",
            ));
        }
        if self.ocr.charset.is_empty() {
            return Err(StabilizerError::invalid_config("ocr.charset is empty"));
        }
        if self.keying.grid_size <= 0.0 {
            return Err(StabilizerError::invalid_config(
                "keying.grid_size must be positive",
            ));
        }
        if self.normalizer.min_width < 2
            || self.normalizer.min_height < 2
            || self.normalizer.min_width > self.normalizer.max_width
            || self.normalizer.min_height > self.normalizer.max_height
        {
            return Err(StabilizerError::invalid_config(
                "normalizer sizes must satisfy 2 <= min <= max",
            ));
        }
        let (low, high) = (self.normalizer.canny_low, self.normalizer.canny_high);
        if !(low.is_finite() && high.is_finite() && low >= 0.0 && low <= high) {
            return Err(StabilizerError::invalid_config(format!(
                "normalizer canny thresholds must satisfy 0 <= low <= high, got {low} / {high}"
            )));
        }
        if self.normalizer.blur_sigma <= 0.0 {
            return Err(StabilizerError::invalid_config(
                "normalizer.blur_sigma must be positive",
            ));
        }

        positive("voter.history_capacity", self.voter.history_capacity as u64)?;
        positive("lock.min_stable", self.lock.min_stable as u64)?;
        positive("lock.miss_tolerance", self.lock.miss_tolerance as u64)?;
        positive("retention.max_keys", self.retention.max_keys as u64)?;
        positive("preview.width", self.preview.width as u64)?;
        positive("preview.height", self.preview.height as u64)?;
        positive("burst.frames", self.burst.frames as u64)?;
        positive("normalizer.clahe_tiles", self.normalizer.clahe_tiles as u64)?;
        Ok(())
    }
}

/// Detector-output filters applied before association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Vehicle class ids kept (COCO: 2 = car, 3 = motorcycle)
    #[serde(default = "default_vehicle_classes")]
    pub vehicle_classes: Vec<u32>,

    #[serde(default = "default_vehicle_min_confidence")]
    pub vehicle_min_confidence: f32,

    #[serde(default = "default_plate_min_confidence")]
    pub plate_min_confidence: f32,
}

fn default_vehicle_classes() -> Vec<u32> {
    vec![2, 3]
}

fn default_vehicle_min_confidence() -> f32 {
    0.5
}

fn default_plate_min_confidence() -> f32 {
    0.55
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            vehicle_classes: default_vehicle_classes(),
            vehicle_min_confidence: default_vehicle_min_confidence(),
            plate_min_confidence: default_plate_min_confidence(),
        }
    }
}

/// How glyphs are split into text rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSegmentation {
    /// Walk glyphs top to bottom, starting a new row on a large vertical gap.
    #[default]
    AdjacentGap,
    /// Split into at most two rows with a 1-D two-means on vertical centers.
    TwoCluster,
}

/// Character recognition and text assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Minimum confidence for a character detection to be considered at all
    #[serde(default = "default_char_confidence")]
    pub char_confidence: f32,

    /// Minimum confidence for a glyph to be written into the final string
    #[serde(default = "default_assembly_floor")]
    pub assembly_floor: f32,

    /// IoU above which overlapping glyphs are suppressed
    #[serde(default = "default_nms_iou")]
    pub nms_iou: f32,

    /// Row threshold as a fraction of the average glyph height
    #[serde(default = "default_row_threshold_factor")]
    pub row_threshold_factor: f32,

    #[serde(default)]
    pub row_segmentation: RowSegmentation,

    /// Replace `O` with `0` when digits are at least as common as letters
    #[serde(default = "default_true")]
    pub digit_heavy_o_to_zero: bool,

    /// Recognizer vocabulary, indexed by class id
    #[serde(default = "default_charset")]
    pub charset: String,
}

fn default_char_confidence() -> f32 {
    0.15
}

fn default_assembly_floor() -> f32 {
    0.35
}

fn default_nms_iou() -> f32 {
    0.25
}

fn default_row_threshold_factor() -> f32 {
    0.6
}

fn default_true() -> bool {
    true
}

fn default_charset() -> String {
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            char_confidence: default_char_confidence(),
            assembly_floor: default_assembly_floor(),
            nms_iou: default_nms_iou(),
            row_threshold_factor: default_row_threshold_factor(),
            row_segmentation: RowSegmentation::default(),
            digit_heavy_o_to_zero: true,
            charset: default_charset(),
        }
    }
}

/// Plate crop rectification and enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    pub blur_sigma: f32,
    /// Contours covering less than this fraction of the crop are ignored
    pub min_contour_fraction: f32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub clahe_clip_limit: f32,
    pub clahe_tiles: u32,
    /// Crops shorter than this are upscaled to it
    pub target_height: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            blur_sigma: 0.8,
            min_contour_fraction: 0.1,
            min_width: 32,
            max_width: 1024,
            min_height: 16,
            max_height: 512,
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            target_height: 64,
        }
    }
}

/// Which box center coordinates feed the grid key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridAxes {
    #[default]
    Horizontal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyingConfig {
    pub grid_size: f32,
    pub axes: GridAxes,
    /// Minimum IoU for a detection to continue a track (tracker keying)
    pub track_min_iou: f32,
    /// Frames a track may go unmatched before it is dropped (tracker keying)
    pub track_max_misses: u32,
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self {
            grid_size: 60.0,
            axes: GridAxes::Horizontal,
            track_min_iou: 0.3,
            track_max_misses: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoterConfig {
    pub history_capacity: usize,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            history_capacity: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    pub alpha: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self { alpha: 0.6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Decisive challenger frames needed before the lock switches
    pub min_stable: u32,
    /// Consecutive empty frames tolerated before the lock is released
    pub miss_tolerance: u32,
    /// How much a challenger must beat the locked best score by
    pub challenge_margin: f32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            min_stable: 3,
            miss_tolerance: 12,
            challenge_margin: 1.0,
        }
    }
}

/// Reclaiming per-key state for objects that left the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Entries not observed for this many frames are dropped
    pub ttl_frames: u64,
    /// How often (in frames) the sweep runs
    pub sweep_interval: u64,
    /// Hard cap on tracked keys; least recently seen are evicted first
    pub max_keys: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_frames: 90,
            sweep_interval: 30,
            max_keys: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 220,
            height: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub frames: usize,
    pub delay_ms: u64,
    pub plate_confidence_weight: f32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            frames: 6,
            delay_ms: 80,
            plate_confidence_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Consecutive failed frame reads tolerated mid-stream
    pub max_consecutive_read_failures: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_consecutive_read_failures: 30,
        }
    }
}
