//! Kryon-33 alphabet: the fixed letter → rank table and the code mapper.
//!
//! Every Cyrillic capital letter maps to its 1-based position in the
//! 33-letter alphabet (Ё sits between Е and Ж; Ь, Ы, Ъ follow Щ in that order).

use crate::error::{EncoderError, Result};

/// Number of letters in the alphabet.
pub const ALPHABET_SIZE: usize = 33;

/// Letters in rank order; the rank of `KRYON_LETTERS[i]` is `i + 1`.
pub const KRYON_LETTERS: [char; ALPHABET_SIZE] = [
    'А', 'Б', 'В', 'Г', 'Д', 'Е', 'Ё', 'Ж', 'З', 'И', 'Й', 'К', 'Л', 'М', 'Н', 'О', 'П', 'Р', 'С',
    'Т', 'У', 'Ф', 'Х', 'Ц', 'Ч', 'Ш', 'Щ', 'Ь', 'Ы', 'Ъ', 'Э', 'Ю', 'Я',
];

/// Rank (1..=33) of an uppercase alphabet letter, `None` for anything else.
///
/// # Examples
///
/// ```
/// use kryon_encoder::alphabet::letter_value;
///
/// assert_eq!(letter_value('А'), Some(1));
/// assert_eq!(letter_value('Ё'), Some(7));
/// assert_eq!(letter_value('Я'), Some(33));
/// assert_eq!(letter_value('a'), None);
/// ```
pub fn letter_value(ch: char) -> Option<u32> {
    KRYON_LETTERS
        .iter()
        .position(|&letter| letter == ch)
        .map(|idx| idx as u32 + 1)
}

/// Uppercase the input and drop every character outside the alphabet.
///
/// Total for all unicode input: foreign characters are silently removed.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_uppercase)
        .filter(|ch| letter_value(*ch).is_some())
        .collect()
}

/// Sum of letter ranks over an already-normalized string.
///
/// Saturates at `u32::MAX` instead of wrapping; any such code is far past
/// the speller range and ends up as out-of-range downstream.
pub fn code_of(normalized: &str) -> u32 {
    saturating_sum(normalized.chars().filter_map(letter_value))
}

fn saturating_sum(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().fold(0, u32::saturating_add)
}

/// Normalize `text` and compute its code.
///
/// Fails with [`EncoderError::NoLetters`] when nothing survives
/// normalization; a code of zero is never returned.
///
/// # Examples
///
/// ```
/// use kryon_encoder::alphabet::encode;
///
/// let (norm, code) = encode("свет!").unwrap();
/// assert_eq!(norm, "СВЕТ");
/// assert_eq!(code, 19 + 3 + 6 + 20);
/// assert!(encode("hello 123").is_err());
/// ```
pub fn encode(text: &str) -> Result<(String, u32)> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Err(EncoderError::NoLetters);
    }
    let code = code_of(&normalized);
    Ok((normalized, code))
}

/// Code of the first letter of a normalized word, if any.
pub fn first_letter_value(normalized: &str) -> Option<(char, u32)> {
    let first = normalized.chars().next()?;
    letter_value(first).map(|v| (first, v))
}
