//! Word splitting for comment bodies, string literals and identifiers.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Letters (`L*`) and decimal digits (`Nd`). Superscripts, fractions and
/// letter-like numerals such as `Ⅻ` are separators.
pub fn is_word_char(ch: char) -> bool {
    matches!(
        get_general_category(ch),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

/// Split text into lowercase runs of letters and decimal digits; every
/// other character separates words and is dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if is_word_char(ch) {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Split an identifier into its component words.
///
/// `snake_case` splits on underscores and keeps the original casing;
/// everything else splits before each uppercase letter after the first
/// character, lowercasing each piece.
pub fn split_identifier(ident: &str) -> Vec<String> {
    if ident.contains('_') {
        return ident.split('_').map(str::to_string).collect();
    }

    let mut words = Vec::new();
    let mut current = String::new();
    for (idx, ch) in ident.char_indices() {
        if idx > 0 && ch.is_uppercase() && !current.is_empty() {
            words.push(current.to_lowercase());
            current.clear();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current.to_lowercase());
    }
    words
}
