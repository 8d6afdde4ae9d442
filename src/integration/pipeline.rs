//! PlatePipeline for combining frame capture, detection and stabilization.

use std::ops::ControlFlow;

use super::{DetectionSource, FrameSource};
use crate::config::{EngineConfig, PipelineConfig};
use crate::detection::FrameDetections;
use crate::error::{Result, StabilizerError};
use crate::stabilize::{FrameReport, StabilizationEngine};
use crate::tracker::{GridKeyResolver, IdentityResolver};

/// What one pipeline step produced.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Frame(FrameReport),
    /// A frame read failed mid-stream
    StreamLost { consecutive_failures: u32 },
    /// The source reported end of stream
    End,
}

/// Drives frames from a [`FrameSource`] through a [`DetectionSource`] and
/// the [`StabilizationEngine`].
///
/// Failing to obtain the first frame is fatal. Later read failures are
/// reported as [`PipelineEvent::StreamLost`] and only abort the run after
/// `max_consecutive_read_failures` in a row.
pub struct PlatePipeline<F, D, R = GridKeyResolver> {
    frames: F,
    detector: D,
    engine: StabilizationEngine<R>,
    config: PipelineConfig,
    started: bool,
    consecutive_failures: u32,
}

impl<F: FrameSource, D: DetectionSource> PlatePipeline<F, D, GridKeyResolver> {
    /// Create a pipeline with a grid-keyed engine.
    pub fn new(frames: F, detector: D, config: EngineConfig) -> Result<Self> {
        let pipeline = config.pipeline.clone();
        let engine = StabilizationEngine::new(config)?;
        Ok(Self::with_engine(frames, detector, engine, pipeline))
    }
}

impl<F, D, R> PlatePipeline<F, D, R>
where
    F: FrameSource,
    D: DetectionSource,
    R: IdentityResolver,
{
    pub fn with_engine(
        frames: F,
        detector: D,
        engine: StabilizationEngine<R>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            frames,
            detector,
            engine,
            config,
            started: false,
            consecutive_failures: 0,
        }
    }

    /// Read and process one frame.
    pub fn step(&mut self) -> Result<PipelineEvent> {
        let frame = match self.frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) if !self.started => {
                return Err(StabilizerError::source_unavailable(
                    "frame source ended before the first frame",
                ));
            }
            Ok(None) => return Ok(PipelineEvent::End),
            Err(err) if !self.started => {
                return Err(StabilizerError::source_unavailable(err.to_string()));
            }
            Err(err) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    %err,
                    failures = self.consecutive_failures,
                    "frame read failed, stream lost"
                );
                if self.consecutive_failures >= self.config.max_consecutive_read_failures {
                    return Err(StabilizerError::SourceLost {
                        failures: self.consecutive_failures,
                    });
                }
                return Ok(PipelineEvent::StreamLost {
                    consecutive_failures: self.consecutive_failures,
                });
            }
        };
        self.started = true;
        self.consecutive_failures = 0;

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(err) => {
                tracing::warn!(%err, "detection failed, treating frame as empty");
                FrameDetections::default()
            }
        };
        let report = self
            .engine
            .process_frame(&frame, &detections, &mut self.detector);
        Ok(PipelineEvent::Frame(report))
    }

    /// Step until end of stream, an error, or `on_event` breaks.
    ///
    /// Returns the number of frames processed.
    pub fn run<C>(&mut self, mut on_event: C) -> Result<u64>
    where
        C: FnMut(&PipelineEvent) -> ControlFlow<()>,
    {
        let mut processed = 0;
        loop {
            let event = self.step()?;
            if matches!(event, PipelineEvent::Frame(_)) {
                processed += 1;
            }
            let ended = matches!(event, PipelineEvent::End);
            if on_event(&event).is_break() || ended {
                return Ok(processed);
            }
        }
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &StabilizationEngine<R> {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut StabilizationEngine<R> {
        &mut self.engine
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a mutable reference to the frame source.
    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }
}
