//! Plate text: glyph labels, row assembly, normalization and scoring.

mod assembler;
mod glyph;
mod normalize;
mod score;

pub use assembler::{CharacterAssembler, PlateReading, suppress_overlapping};
pub use glyph::{CharacterGlyph, CharacterSet};
pub use normalize::normalize_plate_text;
pub use score::{GLYPH_CONFIDENCE_WEIGHT, count_alnum, score_plate, score_with_plate_confidence};
