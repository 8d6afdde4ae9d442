//! One-shot plate capture over a short burst of frames.

use std::thread;
use std::time::Duration;

use serde::Serialize;

use super::{DetectionSource, FrameSource};
use crate::config::{BurstConfig, DetectionConfig, EngineConfig};
use crate::detection::Detection;
use crate::error::{Result, StabilizerError};
use crate::geometry::BBox;
use crate::plate::PlateReader;
use crate::stabilize::{BurstReading, vote_burst};
use crate::text::{count_alnum, score_with_plate_confidence};
use crate::tracker::filter_detections;

/// Outcome of a burst capture, ready to hand to a check-in/check-out
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResult {
    pub text: String,
    /// Frames actually read from the source
    pub frames: usize,
    /// Frames whose reading agreed with `text`
    pub votes: usize,
    /// Plate box of the best-scoring reading of `text`
    pub bbox: BBox,
    pub plate_confidence: f32,
    pub char_count: usize,
}

/// Reads the most confident plate of each of N frames and votes.
#[derive(Debug, Clone)]
pub struct BurstCapture {
    burst: BurstConfig,
    detection: DetectionConfig,
    reader: PlateReader,
}

impl Default for BurstCapture {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl BurstCapture {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            burst: config.burst.clone(),
            detection: config.detection.clone(),
            reader: PlateReader::new(config),
        }
    }

    /// Grab up to `frames` frames, `delay_ms` apart, and vote on the plate
    /// text.
    ///
    /// Frames that fail to read or detect are skipped. Fails with
    /// [`StabilizerError::EmptyBurst`] when no frame produced text.
    pub fn capture<F, D>(&self, frames: &mut F, detector: &mut D) -> Result<CaptureResult>
    where
        F: FrameSource + ?Sized,
        D: DetectionSource + ?Sized,
    {
        let delay = Duration::from_millis(self.burst.delay_ms);
        let mut frames_read = 0;
        let mut readings = Vec::with_capacity(self.burst.frames);
        let mut plates: Vec<Detection> = Vec::with_capacity(self.burst.frames);

        for attempt in 0..self.burst.frames {
            if attempt > 0 && !delay.is_zero() {
                thread::sleep(delay);
            }
            let frame = match frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(%err, attempt, "burst frame read failed");
                    continue;
                }
            };
            frames_read += 1;

            let detections = match detector.detect(&frame) {
                Ok(detections) => filter_detections(&detections, &self.detection),
                Err(err) => {
                    tracing::warn!(%err, attempt, "burst detection failed");
                    continue;
                }
            };
            let Some(plate) = most_confident(&detections.plates) else {
                continue;
            };
            let Some(reading) = self.reader.read(&frame, &plate.bbox, detector) else {
                continue;
            };
            if reading.is_empty() {
                continue;
            }
            let score = score_with_plate_confidence(
                &reading.text,
                plate.score,
                self.burst.plate_confidence_weight,
            );
            readings.push(BurstReading::new(reading.text, score));
            plates.push(*plate);
        }

        let vote = vote_burst(&readings).ok_or(StabilizerError::EmptyBurst)?;
        let best = readings
            .iter()
            .zip(&plates)
            .filter(|(reading, _)| reading.text == vote.text)
            .fold(None::<(&BurstReading, &Detection)>, |best, item| match best {
                Some(b) if b.0.score >= item.0.score => Some(b),
                _ => Some(item),
            })
            .map(|(_, plate)| *plate)
            .ok_or(StabilizerError::EmptyBurst)?;

        let result = CaptureResult {
            char_count: count_alnum(&vote.text),
            text: vote.text,
            frames: frames_read,
            votes: vote.votes,
            bbox: best.bbox,
            plate_confidence: best.score,
        };
        tracing::info!(text = %result.text, votes = result.votes, frames = result.frames, "burst capture finished");
        Ok(result)
    }
}

fn most_confident(plates: &[Detection]) -> Option<&Detection> {
    plates.iter().fold(None, |best: Option<&Detection>, plate| match best {
        Some(b) if b.score >= plate.score => Some(b),
        _ => Some(plate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::FrameDetections;
    use image::RgbImage;
    use std::collections::VecDeque;

    struct ScriptedSource {
        frames: usize,
        texts: VecDeque<&'static str>,
        plates: Vec<Detection>,
    }

    impl FrameSource for ScriptedSource {
        type Error = String;

        fn next_frame(&mut self) -> std::result::Result<Option<RgbImage>, Self::Error> {
            if self.frames == 0 {
                return Ok(None);
            }
            self.frames -= 1;
            Ok(Some(RgbImage::new(320, 240)))
        }
    }

    impl DetectionSource for ScriptedSource {
        type Error = String;

        fn detect(&mut self, _frame: &RgbImage) -> std::result::Result<FrameDetections, Self::Error> {
            Ok(FrameDetections::plates_only(self.plates.clone()))
        }

        fn recognize_characters(
            &mut self,
            _plate: &RgbImage,
        ) -> std::result::Result<Vec<Detection>, Self::Error> {
            let text = self.texts.pop_front().ok_or("script exhausted")?;
            let charset = crate::text::CharacterSet::default();
            Ok(text
                .chars()
                .enumerate()
                .filter_map(|(i, c)| {
                    let id = (0..charset.len() as u32).find(|id| charset.label(*id) == Some(c))?;
                    let x = i as f32 * 12.0;
                    Some(Detection::new(x, 0.0, x + 10.0, 20.0, 0.9, id))
                })
                .collect())
        }
    }

    fn no_delay() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.burst.delay_ms = 0;
        config
    }

    #[test]
    fn test_capture_votes_majority() {
        let capture = BurstCapture::new(&no_delay());
        let mut source = ScriptedSource {
            frames: 6,
            texts: VecDeque::from(vec!["AB123", "AB123", "CD456", "AB123", "AB128", "AB123"]),
            plates: vec![
                Detection::new(10.0, 10.0, 110.0, 40.0, 0.7, 0),
                Detection::new(150.0, 10.0, 250.0, 40.0, 0.9, 0),
            ],
        };
        let mut frames = ScriptedSource {
            frames: 6,
            texts: VecDeque::new(),
            plates: vec![],
        };
        let result = capture.capture(&mut frames, &mut source).unwrap();
        assert_eq!(result.text, "AB123");
        assert_eq!(result.votes, 4);
        assert_eq!(result.frames, 6);
        assert_eq!(result.char_count, 5);
        assert_eq!(result.plate_confidence, 0.9);
        assert_eq!(result.bbox, BBox::new(150.0, 10.0, 250.0, 40.0));
    }

    #[test]
    fn test_capture_without_plates_fails() {
        let capture = BurstCapture::new(&no_delay());
        let mut source = ScriptedSource {
            frames: 3,
            texts: VecDeque::new(),
            plates: vec![],
        };
        let mut frames = ScriptedSource {
            frames: 3,
            texts: VecDeque::new(),
            plates: vec![],
        };
        let err = capture.capture(&mut frames, &mut source).unwrap_err();
        assert!(matches!(err, StabilizerError::EmptyBurst));
    }

    #[test]
    fn test_short_stream_counts_frames_read() {
        let capture = BurstCapture::new(&no_delay());
        let mut detector = ScriptedSource {
            frames: 0,
            texts: VecDeque::from(vec!["XY99"]),
            plates: vec![Detection::new(10.0, 10.0, 110.0, 40.0, 0.8, 0)],
        };
        let mut frames = ScriptedSource {
            frames: 2,
            texts: VecDeque::new(),
            plates: vec![],
        };
        let result = capture.capture(&mut frames, &mut detector).unwrap();
        assert_eq!(result.frames, 2);
        assert_eq!(result.votes, 1);
        assert_eq!(result.text, "XY99");
    }
}
