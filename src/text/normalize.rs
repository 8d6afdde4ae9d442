/// Clean up an assembled plate string.
///
/// Uppercases, keeps only `A-Z`, `0-9`, `-` and space, trims, and when
/// `digit_heavy_o_to_zero` is set replaces every `O` with `0` if digits are
/// at least as common as letters.
pub fn normalize_plate_text(raw: &str, digit_heavy_o_to_zero: bool) -> String {
    let cleaned: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-' || *c == ' ')
        .collect();
    let cleaned = cleaned.trim();

    if digit_heavy_o_to_zero && is_digit_heavy(cleaned) {
        cleaned.replace('O', "0")
    } else {
        cleaned.to_string()
    }
}

fn is_digit_heavy(text: &str) -> bool {
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    digits >= letters
}
