use super::CharacterGlyph;

/// Weight of the mean glyph confidence in [`score_plate`].
pub const GLYPH_CONFIDENCE_WEIGHT: f32 = 0.5;

/// Number of alphanumeric characters, ignoring spaces and dashes.
pub fn count_alnum(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

/// `count_alnum(text) + 0.5 * mean(glyph confidence)`, or 0 without glyphs.
pub fn score_plate(text: &str, glyphs: &[CharacterGlyph]) -> f32 {
    if glyphs.is_empty() {
        return 0.0;
    }
    let mean = glyphs.iter().map(|g| g.confidence()).sum::<f32>() / glyphs.len() as f32;
    count_alnum(text) as f32 + GLYPH_CONFIDENCE_WEIGHT * mean
}

/// Burst-capture variant: the plate detector's confidence replaces the
/// glyph mean as the fractional term.
pub fn score_with_plate_confidence(text: &str, plate_confidence: f32, weight: f32) -> f32 {
    count_alnum(text) as f32 + weight * plate_confidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;

    fn glyph(score: f32) -> CharacterGlyph {
        CharacterGlyph::new(Detection::new(0.0, 0.0, 5.0, 10.0, score, 0), 'A')
    }

    #[test]
    fn test_score_counts_alnum_and_confidence() {
        let glyphs = [glyph(0.8), glyph(0.6)];
        let score = score_plate("AB 12-3", &glyphs);
        assert!((score - (5.0 + 0.5 * 0.7)).abs() < 1e-5);
    }

    #[test]
    fn test_score_without_glyphs_is_zero() {
        assert_eq!(score_plate("ABC", &[]), 0.0);
    }

    #[test]
    fn test_longer_text_beats_confident_short_text() {
        let long = score_plate("AB1234", &[glyph(0.4)]);
        let short = score_plate("AB1", &[glyph(1.0)]);
        assert!(long > short);
    }

    #[test]
    fn test_burst_score() {
        let score = score_with_plate_confidence("51A 12345", 0.9, 0.2);
        assert!((score - 8.18).abs() < 1e-5);
    }
}
