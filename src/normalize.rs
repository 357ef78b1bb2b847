//! Text folding applied to captured AUT output before keyword matching.
//!
//! The AUT prints French text whose accents survive or not depending on the
//! console code page, so every comparison goes through the same fold.
use unicode_normalization::UnicodeNormalization;

/// Decompose (NFKD), drop everything outside ASCII, and lower-case.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Substring match after folding both sides.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize(haystack).contains(&normalize(needle))
}
