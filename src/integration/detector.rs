//! Traits for detection backends and frame sources.

use std::fmt;

use image::RgbImage;

use crate::detection::{Detection, FrameDetections};

/// Trait for plate detection and character recognition backends.
///
/// Implement this trait to connect the detector models to the engine.
///
/// # Example
///
/// ```ignore
/// use anpr_stabilizer::{Detection, DetectionSource, FrameDetections};
/// use image::RgbImage;
///
/// struct MyModels {
///     // vehicle, plate and character models here
/// }
///
/// impl DetectionSource for MyModels {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &RgbImage) -> Result<FrameDetections, Self::Error> {
///         Ok(FrameDetections::default())
///     }
///
///     fn recognize_characters(&mut self, plate: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for inference failures.
    type Error: fmt::Display;

    /// Vehicle and plate detections for a full frame.
    fn detect(&mut self, frame: &RgbImage) -> Result<FrameDetections, Self::Error>;

    /// Character detections for a normalized plate crop.
    ///
    /// `class_id` of each detection indexes the configured
    /// [`CharacterSet`](crate::text::CharacterSet).
    fn recognize_characters(&mut self, plate: &RgbImage) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: DetectionSource + ?Sized> DetectionSource for &mut D {
    type Error = D::Error;

    fn detect(&mut self, frame: &RgbImage) -> Result<FrameDetections, Self::Error> {
        (**self).detect(frame)
    }

    fn recognize_characters(&mut self, plate: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
        (**self).recognize_characters(plate)
    }
}

/// Source of video frames.
pub trait FrameSource {
    type Error: fmt::Display;

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error>;
}

impl<F: FrameSource + ?Sized> FrameSource for &mut F {
    type Error = F::Error;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error> {
        (**self).next_frame()
    }
}
