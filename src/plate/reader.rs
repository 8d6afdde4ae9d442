use image::RgbImage;

use super::PlateNormalizer;
use crate::config::EngineConfig;
use crate::geometry::{BBox, safe_crop};
use crate::integration::DetectionSource;
use crate::text::{CharacterAssembler, CharacterSet, PlateReading};

/// Crop, normalize, recognize and assemble one plate.
#[derive(Debug, Clone)]
pub struct PlateReader {
    charset: CharacterSet,
    normalizer: PlateNormalizer,
    assembler: CharacterAssembler,
    char_confidence: f32,
}

impl Default for PlateReader {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl PlateReader {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            charset: CharacterSet::new(&config.ocr.charset),
            normalizer: PlateNormalizer::new(config.normalizer.clone()),
            assembler: CharacterAssembler::new(&config.ocr),
            char_confidence: config.ocr.char_confidence,
        }
    }

    pub fn charset(&self) -> &CharacterSet {
        &self.charset
    }

    /// Read the plate inside `bbox`.
    ///
    /// `None` when the box leaves nothing to crop or the recognizer fails;
    /// a plate without readable characters gives an empty reading.
    pub fn read<D>(&self, frame: &RgbImage, bbox: &BBox, source: &mut D) -> Option<PlateReading>
    where
        D: DetectionSource + ?Sized,
    {
        let crop = safe_crop(frame, bbox)?;
        let normalized = self.normalizer.normalize(&crop);
        let characters = match source.recognize_characters(&normalized) {
            Ok(characters) => characters,
            Err(err) => {
                tracing::warn!(%err, "character recognition failed, skipping plate");
                return None;
            }
        };
        let glyphs = self.charset.resolve(&characters, self.char_confidence);
        Some(self.assembler.read(glyphs))
    }
}
