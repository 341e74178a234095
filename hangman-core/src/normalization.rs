use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Upper-cases and strips diacritics, so `"Canción"` and `"CANCION"` compare
/// equal. Both the guessed letter and the target word go through here.
pub fn normalize_word(word: &str) -> String {
    word.to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Parses a guessed letter. Exactly one non-whitespace character is accepted,
/// and it must still be one character after normalization (`ß` is not).
pub fn normalize_letter(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    let letter = chars.next()?;
    if chars.next().is_some() || letter.is_whitespace() {
        return None;
    }

    let normalized_word = normalize_word(&letter.to_string());
    let mut normalized = normalized_word.chars();
    match (normalized.next(), normalized.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Letters that count toward a win and toward the word length used in scoring.
pub fn scoring_length(word: &str) -> usize {
    word.chars().filter(|c| !c.is_whitespace()).count()
}
