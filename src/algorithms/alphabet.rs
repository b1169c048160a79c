//! Pattern alphabet for the bitap matcher
//!
//! Maps each pattern character to a bitmask of the positions it occupies,
//! most significant bit first, so that bit `len - 1` is the first character.

use ahash::AHashMap;

/// Character -> position bitmask lookup for one pattern chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternAlphabet {
    masks: AHashMap<char, u32>,
}

impl PatternAlphabet {
    /// Build the alphabet for a pattern of at most 32 characters.
    ///
    /// Longer patterns must be chunked first; characters past bit 31 would
    /// otherwise be shifted out of the mask.
    pub fn new(pattern: &[char]) -> Self {
        let len = pattern.len();
        let mut masks: AHashMap<char, u32> = AHashMap::with_capacity(len.min(26));
        for (i, &c) in pattern.iter().enumerate() {
            *masks.entry(c).or_insert(0) |= 1u32 << (len - i - 1);
        }
        Self { masks }
    }

    /// Bitmask for `c`, zero if the character does not occur in the pattern
    #[inline]
    pub fn mask(&self, c: char) -> u32 {
        self.masks.get(&c).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

/// Convenience wrapper building the alphabet from a string slice
pub fn create_pattern_alphabet(pattern: &str) -> PatternAlphabet {
    let chars: Vec<char> = pattern.chars().collect();
    PatternAlphabet::new(&chars)
}
