//! Integration module for connecting detection backends and frame sources
//! with the stabilization engine.
//!
//! This module provides the backend traits, the continuous frame pipeline
//! and the one-shot burst capture task.

mod builder;
mod capture;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use capture::{BurstCapture, CaptureResult};
pub use detector::{DetectionSource, FrameSource};
pub use pipeline::{PipelineEvent, PlatePipeline};
