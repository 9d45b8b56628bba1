//! Segment matching: normalization, synonym lookup and fuzzy fallback.

pub mod fuzzy;
pub mod normalize;
pub mod synonyms;

pub use fuzzy::{best_match, resolve_segments, FuzzyMatch};
pub use normalize::{normalize_label, normalize_token, strip_diacritics};
pub use synonyms::{SynonymEntry, SynonymIndex};
