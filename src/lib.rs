//! Stabilization of frame-by-frame license plate detections.
//!
//! Detection and character recognition are supplied externally through
//! [`DetectionSource`]. This crate associates plates with vehicles, assigns
//! them a per-object key, assembles character detections into text, votes
//! over recent readings, smooths plate boxes and locks the preview onto one
//! plate.

pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod integration;
pub mod plate;
pub mod stabilize;
pub mod text;
pub mod tracker;

pub use config::EngineConfig;
pub use detection::{Detection, FrameDetections};
pub use error::{Result, StabilizerError};
pub use geometry::BBox;
pub use integration::{
    BurstCapture, CaptureResult, DetectionBuilder, DetectionSource, FrameSource, PipelineEvent,
    PlatePipeline,
};
pub use stabilize::{FrameReport, LockState, Preview, PreviewSource, StabilizationEngine};
pub use tracker::{GridKeyResolver, IdentityResolver, ObjectKey, TrackerKeyResolver};
