//! Per-frame stabilization: association, keying, reading, voting,
//! smoothing and the preview lock.

use image::RgbImage;
use image::imageops::{self, FilterType};
use serde::Serialize;

use super::lock::{LockMachine, LockState, LockTransition};
use super::smoother::BoxSmoother;
use super::voter::TemporalVoter;
use crate::config::EngineConfig;
use crate::detection::{Detection, FrameDetections};
use crate::error::Result;
use crate::geometry::{BBox, safe_crop};
use crate::integration::DetectionSource;
use crate::plate::PlateReader;
use crate::text::PlateReading;
use crate::tracker::{GridKeyResolver, IdentityResolver, ObjectKey, associate, filter_detections};

/// Frame text when no plate was read.
pub const NO_PLATE_TEXT: &str = "N/A";

/// One plate read in the current frame.
#[derive(Debug, Clone, Serialize)]
pub struct PlateObservation {
    pub key: ObjectKey,
    pub plate: Detection,
    /// Plate box after exponential smoothing
    pub smoothed: BBox,
    pub reading: PlateReading,
    /// Majority text for the key, falling back to the raw reading
    pub display_text: String,
    /// Whether the smoothed box yielded a preview crop
    pub has_preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PreviewSource {
    /// Crop of the locked plate
    Locked,
    /// Best plate of the frame, shown while nothing is locked
    Candidate,
    /// Last good preview, repeated because this frame produced none
    Retained,
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub source: PreviewSource,
    pub key: ObjectKey,
    /// Smoothed box the image was cropped from
    pub region: BBox,
    /// Crop resized to the configured preview size
    pub image: RgbImage,
}

/// Result of [`StabilizationEngine::process_frame`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Best plate text of the frame, or [`NO_PLATE_TEXT`]
    pub text: String,
    pub lock: LockState,
    pub transition: LockTransition,
    pub preview: Option<Preview>,
    pub observations: Vec<PlateObservation>,
}

impl FrameReport {
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn status(&self) -> &'static str {
        if self.is_locked() { "LOCKED" } else { "UNLOCKED" }
    }
}

/// Owns all temporal state of the plate reading loop.
///
/// Identity resolution is pluggable; the default buckets plate centers on a
/// grid.
pub struct StabilizationEngine<R = GridKeyResolver> {
    config: EngineConfig,
    resolver: R,
    reader: PlateReader,
    voter: TemporalVoter,
    smoother: BoxSmoother,
    lock: LockMachine,
    last_preview: Option<Preview>,
    frame_index: u64,
}

impl StabilizationEngine<GridKeyResolver> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let resolver = GridKeyResolver::new(&config.keying);
        Self::with_resolver(config, resolver)
    }
}

impl<R: IdentityResolver> StabilizationEngine<R> {
    pub fn with_resolver(config: EngineConfig, resolver: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader: PlateReader::new(&config),
            voter: TemporalVoter::new(&config.voter),
            smoother: BoxSmoother::new(&config.smoother),
            lock: LockMachine::new(config.lock.clone()),
            config,
            resolver,
            last_preview: None,
            frame_index: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn lock_state(&self) -> &LockState {
        self.lock.state()
    }

    pub fn voter(&self) -> &TemporalVoter {
        &self.voter
    }

    pub fn smoother(&self) -> &BoxSmoother {
        &self.smoother
    }

    pub fn last_preview(&self) -> Option<&Preview> {
        self.last_preview.as_ref()
    }

    /// Frames processed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Run one frame through the engine.
    ///
    /// `detections` are the detector's raw outputs for `frame`; `source` is
    /// used for character recognition on each plate.
    pub fn process_frame<D>(
        &mut self,
        frame: &RgbImage,
        detections: &FrameDetections,
        source: &mut D,
    ) -> FrameReport
    where
        D: DetectionSource + ?Sized,
    {
        self.frame_index += 1;
        let frame_index = self.frame_index;

        let filtered = filter_detections(detections, &self.config.detection);
        let association = associate(&filtered.vehicles, &filtered.plates);
        let plates: Vec<Detection> = association.plates().copied().collect();
        let boxes: Vec<BBox> = plates.iter().map(|p| p.bbox).collect();
        let keys = self.resolver.resolve(&boxes);

        let mut observations = Vec::with_capacity(plates.len());
        let mut crops = Vec::with_capacity(plates.len());
        for (plate, key) in plates.iter().zip(keys) {
            let smoothed = self.smoother.smooth(key, plate.bbox, frame_index);
            let Some(reading) = self.reader.read(frame, &plate.bbox, source) else {
                continue;
            };
            self.voter.observe(key, &reading.text, frame_index);
            let display_text = self.voter.display_text(&key, &reading.text);
            let crop = safe_crop(frame, &smoothed);
            tracing::debug!(%key, text = %reading.text, score = reading.score, "plate read");

            observations.push(PlateObservation {
                key,
                plate: *plate,
                smoothed,
                reading,
                display_text,
                has_preview: crop.is_some(),
            });
            crops.push(crop);
        }

        let candidate = best_observation(&observations, |obs| obs.has_preview);
        let transition = self
            .lock
            .update(candidate.map(|i| (observations[i].key, observations[i].reading.score)));

        let locked_key = self.lock.locked_key();
        let locked = locked_key.and_then(|key| {
            observations
                .iter()
                .position(|obs| obs.key == key && obs.has_preview)
        });

        let fresh = match (locked_key, locked, candidate) {
            (Some(_), Some(i), _) => Some((PreviewSource::Locked, i)),
            (None, _, Some(i)) => Some((PreviewSource::Candidate, i)),
            _ => None,
        };
        let rendered = fresh.and_then(|(origin, i)| {
            let crop = crops[i].take()?;
            Some(self.make_preview(origin, &observations[i], &crop))
        });
        let preview = match rendered {
            Some(preview) => {
                self.last_preview = Some(preview.clone());
                Some(preview)
            }
            None => self.last_preview.as_ref().map(|previous| Preview {
                source: PreviewSource::Retained,
                ..previous.clone()
            }),
        };

        let text_index = locked_key
            .and_then(|key| observations.iter().position(|obs| obs.key == key))
            .or(candidate)
            .or_else(|| best_observation(&observations, |_| true));
        let text = text_index
            .map(|i| observations[i].display_text.clone())
            .unwrap_or_else(|| NO_PLATE_TEXT.to_owned());

        self.reclaim_stale_keys(locked_key);

        FrameReport {
            frame_index,
            text,
            lock: *self.lock.state(),
            transition,
            preview,
            observations,
        }
    }

    fn make_preview(&self, source: PreviewSource, obs: &PlateObservation, crop: &RgbImage) -> Preview {
        let image = imageops::resize(
            crop,
            self.config.preview.width,
            self.config.preview.height,
            FilterType::Triangle,
        );
        Preview {
            source,
            key: obs.key,
            region: obs.smoothed,
            image,
        }
    }

    fn reclaim_stale_keys(&mut self, keep: Option<ObjectKey>) {
        let retention = &self.config.retention;
        let mut removed = 0;
        if retention.sweep_interval > 0 && self.frame_index % retention.sweep_interval == 0 {
            removed += self.voter.store_mut().sweep(self.frame_index, retention.ttl_frames, keep);
            removed += self.smoother.store_mut().sweep(self.frame_index, retention.ttl_frames, keep);
        }
        removed += self.voter.store_mut().evict_to(retention.max_keys, keep);
        removed += self.smoother.store_mut().evict_to(retention.max_keys, keep);
        if removed > 0 {
            tracing::debug!(removed, frame = self.frame_index, "reclaimed stale plate keys");
        }
    }
}

/// Index of the highest-scoring observation passing `eligible`; the first
/// one wins ties.
fn best_observation<F>(observations: &[PlateObservation], eligible: F) -> Option<usize>
where
    F: Fn(&PlateObservation) -> bool,
{
    let mut best: Option<usize> = None;
    for (i, obs) in observations.iter().enumerate() {
        if !eligible(obs) {
            continue;
        }
        if best.is_none_or(|b| obs.reading.score > observations[b].reading.score) {
            best = Some(i);
        }
    }
    best
}
