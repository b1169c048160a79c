//! Core approximate matching primitives
//!
//! Each stage is implemented as a standalone module so the bitap engine can be
//! composed from (and tested against) its parts.

pub mod alphabet;
pub mod bitap;
pub mod mask;
pub mod normalize;
pub mod score;

pub use alphabet::{create_pattern_alphabet, PatternAlphabet};
pub use bitap::{BitapOptions, BitapSearch, PatternChunk, SearchResult, MAX_BITS};
pub use mask::{mask_to_ranges, MatchRange};
pub use normalize::{strip_diacritics, TextNormalizer};
pub use score::compute_score;
