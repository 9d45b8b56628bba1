//! Text normalization for segment matching
//!
//! Two equality notions are needed:
//! - `normalize_label`: keeps a single space between words, used to spell
//!   scope tokens for upstream patterns and to name topic groups
//! - `normalize_token`: drops every separator, used as synonym index key
//!
//! Both lower-case and strip diacritics while keeping `ñ` as its own letter.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-') || c.is_whitespace()
}

/// Removes accents (NFD + combining mark removal) except on `ñ`/`Ñ`.
pub fn strip_diacritics(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Compose first so a decomposed "n\u{303}" is seen as 'ñ'.
    for c in s.nfc() {
        match c {
            'ñ' | 'Ñ' => out.push(c),
            _ => out.extend(std::iter::once(c).nfd().filter(|m| !is_combining_mark(*m))),
        }
    }
    out
}

fn fold(s: &str) -> String {
    strip_diacritics(&s.to_lowercase())
}

/// Lower-cased, accent-free, separators collapsed to one space, trimmed.
///
/// ```
/// use tourlytics::matching::normalize::normalize_label;
///
/// assert_eq!(normalize_label("  Punta_Umbría--Playa "), "punta umbria playa");
/// assert_eq!(normalize_label("Cañada.DEL  Rey"), "cañada del rey");
/// ```
pub fn normalize_label(s: &str) -> String {
    let folded: String = fold(s)
        .chars()
        .map(|c| if is_separator(c) { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased, accent-free, every separator removed.
///
/// ```
/// use tourlytics::matching::normalize::normalize_token;
///
/// assert_eq!(normalize_token("Punta_Umbría"), "puntaumbria");
/// assert_eq!(normalize_token("isla-cristina"), normalize_token("Isla Cristina"));
/// ```
pub fn normalize_token(s: &str) -> String {
    fold(s).chars().filter(|c| !is_separator(*c)).collect()
}
