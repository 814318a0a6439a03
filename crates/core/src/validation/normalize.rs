//! Name normalization for matching free-text city and carrier names from
//! fiscal documents against the reference tables.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical matching form: uppercase, trimmed, diacritics stripped via
/// NFD decomposition, internal whitespace collapsed to single spaces.
pub fn normalize(value: &str) -> String {
    let folded: String = value
        .to_uppercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last-resort fuzzy form: normalization plus removal of the Portuguese
/// connective tokens that city registries and documents disagree on
/// ("Feira DE Santana" vs "Feira Santana"), with all spacing dropped.
pub fn strip_prepositions(value: &str) -> String {
    normalize(value)
        .split(' ')
        .filter(|token| !matches!(*token, "DE" | "DA" | "DO" | "DAS" | "DOS"))
        .collect()
}
