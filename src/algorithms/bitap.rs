//! Bitap (Baeza-Yates-Gonnet) approximate substring search
//!
//! Optimized with:
//! - Exact-occurrence pre-pass that tightens the threshold before fuzzy scanning
//! - Binary search of the scan window per error level
//! - Early termination once no higher error count can beat the threshold
//! - Pattern chunking for patterns wider than the 32-bit state vector
//!
//! Each chunk is matched independently; the chunk results are OR-ed for the
//! match flag, averaged for the score and unioned for the ranges.

use super::alphabet::PatternAlphabet;
use super::mask::{mask_to_ranges, MatchRange};
use super::normalize::TextNormalizer;
use super::score::compute_score;
use crate::error::FuseError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Width of the bit-parallel state vector, and therefore the maximum chunk length
pub const MAX_BITS: usize = 32;

/// Lowest score a fuzzy (non-exact) chunk match can report
const MIN_FUZZY_SCORE: f64 = 0.001;

/// Matching parameters consumed by the bitap engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitapOptions {
    /// Where in the text the pattern is expected to start
    pub location: usize,
    /// How far from `location` a match may drift (see `compute_score`)
    pub distance: usize,
    /// Maximum accepted score, 0.0 = exact only, 1.0 = anything
    pub threshold: f64,
    /// Keep scanning to the end of the text even after a perfect match
    pub find_all_matches: bool,
    /// Minimum length of a reported matched run
    pub min_match_char_length: usize,
    /// Report matched character ranges
    pub include_matches: bool,
    /// Score on accuracy alone
    pub ignore_location: bool,
    /// Case and diacritic handling applied to pattern and text
    pub normalizer: TextNormalizer,
}

impl Default for BitapOptions {
    fn default() -> Self {
        Self {
            location: 0,
            distance: 100,
            threshold: 0.6,
            find_all_matches: false,
            min_match_char_length: 1,
            include_matches: false,
            ignore_location: false,
            normalizer: TextNormalizer::default(),
        }
    }
}

/// Outcome of searching one text
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub is_match: bool,
    /// 0.0 is exact; fuzzy matches never go below 0.001
    pub score: f64,
    /// Inclusive character ranges, only filled when `include_matches` is set
    pub ranges: Vec<MatchRange>,
}

impl SearchResult {
    fn miss() -> Self {
        Self {
            is_match: false,
            score: 1.0,
            ranges: Vec::new(),
        }
    }
}

/// One slice of the pattern no wider than `MAX_BITS`
#[derive(Debug, Clone, PartialEq)]
pub struct PatternChunk {
    pub pattern: Vec<char>,
    pub alphabet: PatternAlphabet,
    /// Offset of this chunk within the full pattern
    pub start_index: usize,
}

impl PatternChunk {
    fn new(pattern: &[char], start_index: usize) -> Self {
        Self {
            pattern: pattern.to_vec(),
            alphabet: PatternAlphabet::new(pattern),
            start_index,
        }
    }
}

/// Compiled search pattern, reusable across every text of a query
#[derive(Debug, Clone)]
pub struct BitapSearch {
    pattern: Vec<char>,
    chunks: SmallVec<[PatternChunk; 1]>,
    options: BitapOptions,
}

impl BitapSearch {
    /// Normalize and chunk `pattern`.
    ///
    /// Patterns longer than `MAX_BITS` are cut into full-width chunks; a
    /// remainder is covered by one more full-width chunk anchored at the tail,
    /// overlapping its predecessor.
    pub fn new(pattern: &str, options: BitapOptions) -> Self {
        let pattern = options.normalizer.chars(pattern);
        let mut chunks = SmallVec::new();
        let len = pattern.len();

        if len > MAX_BITS {
            let remainder = len % MAX_BITS;
            let end = len - remainder;
            let mut i = 0;
            while i < end {
                chunks.push(PatternChunk::new(&pattern[i..i + MAX_BITS], i));
                i += MAX_BITS;
            }
            if remainder > 0 {
                let start_index = len - MAX_BITS;
                chunks.push(PatternChunk::new(&pattern[start_index..], start_index));
            }
        } else if len > 0 {
            chunks.push(PatternChunk::new(&pattern, 0));
        }

        Self {
            pattern,
            chunks,
            options,
        }
    }

    /// The normalized pattern
    pub fn pattern(&self) -> &[char] {
        &self.pattern
    }

    pub fn chunks(&self) -> &[PatternChunk] {
        &self.chunks
    }

    pub fn options(&self) -> &BitapOptions {
        &self.options
    }

    /// Search the pattern within `text`
    pub fn search_in(&self, text: &str) -> Result<SearchResult, FuseError> {
        let normalized = self.options.normalizer.chars(text);

        if normalized == self.pattern {
            let len = text.chars().count();
            let ranges = if self.options.include_matches && len > 0 {
                vec![(0, len - 1)]
            } else {
                Vec::new()
            };
            return Ok(SearchResult {
                is_match: true,
                score: 0.0,
                ranges,
            });
        }

        let mut ranges = Vec::new();
        let mut total_score = 0.0;
        let mut has_matches = false;

        for chunk in &self.chunks {
            let result = search_chunk(
                &normalized,
                chunk,
                self.options.location.saturating_add(chunk.start_index),
                &self.options,
            )?;

            total_score += result.score;
            if result.is_match {
                has_matches = true;
                ranges.extend(result.ranges);
            }
        }

        if !has_matches {
            return Ok(SearchResult::miss());
        }

        Ok(SearchResult {
            is_match: true,
            score: total_score / self.chunks.len() as f64,
            ranges: if self.options.include_matches {
                ranges
            } else {
                Vec::new()
            },
        })
    }
}

/// Position of the first occurrence of `pattern` in `text` at or after `from`
fn find_from(text: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if from > text.len() || pattern.len() > text.len() - from {
        return None;
    }
    text[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

/// Bit-parallel approximate search of one chunk.
///
/// `text` must already be normalized the same way as the chunk.
pub fn search_chunk(
    text: &[char],
    chunk: &PatternChunk,
    location: usize,
    options: &BitapOptions,
) -> Result<SearchResult, FuseError> {
    let pattern = chunk.pattern.as_slice();
    let pattern_len = pattern.len();

    if pattern_len > MAX_BITS {
        tracing::error!(
            target: "fuse_search::bitap",
            length = pattern_len,
            max = MAX_BITS,
            "Pattern chunk wider than the bit vector reached the matcher"
        );
        return Err(FuseError::PatternTooLong {
            length: pattern_len,
            max: MAX_BITS,
        });
    }
    if pattern_len == 0 {
        return Ok(SearchResult::miss());
    }

    let score_at = |errors: usize, current: usize, expected: usize| {
        compute_score(
            pattern_len,
            errors,
            current,
            expected,
            options.distance,
            options.ignore_location,
        )
    };

    let text_len = text.len();
    let expected_location = location.min(text_len);
    let mut current_threshold = options.threshold;

    let compute_matches = options.min_match_char_length > 1 || options.include_matches;
    let mut match_mask = if compute_matches {
        vec![false; text_len]
    } else {
        Vec::new()
    };

    // Exact occurrences give a cheap upper bound on the score
    let mut from = expected_location;
    while let Some(index) = find_from(text, pattern, from) {
        let score = score_at(0, index, expected_location);
        current_threshold = current_threshold.min(score);
        from = index + pattern_len;

        if compute_matches {
            match_mask[index..index + pattern_len].fill(true);
        }
    }

    let mut best_location: Option<usize> = None;
    let mut best_score = 1.0;
    let mut last_bit_arr: Vec<u32> = Vec::new();
    let mut bin_max = pattern_len + text_len;
    let mask = 1u32 << (pattern_len - 1);

    for i in 0..pattern_len {
        // Widest window around the expected location still within threshold
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if score_at(i, expected_location + bin_mid, expected_location) <= current_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (expected_location + 1).saturating_sub(bin_mid).max(1);
        let finish = if options.find_all_matches {
            text_len
        } else {
            (expected_location + bin_mid).min(text_len) + pattern_len
        };

        let mut bit_arr = vec![0u32; finish + 2];
        bit_arr[finish + 1] = (1u32 << i) - 1;

        let mut j = finish;
        while j >= start {
            let current_location = j - 1;
            let char_match = text
                .get(current_location)
                .map_or(0, |&c| chunk.alphabet.mask(c));

            if compute_matches && current_location < match_mask.len() {
                match_mask[current_location] = char_match != 0;
            }

            // Exact continuation
            bit_arr[j] = ((bit_arr[j + 1] << 1) | 1) & char_match;

            // Substitution, insertion and deletion from the previous error level
            if i > 0 {
                let prev_next = last_bit_arr.get(j + 1).copied().unwrap_or(0);
                let prev = last_bit_arr.get(j).copied().unwrap_or(0);
                bit_arr[j] |= ((prev_next | prev) << 1) | 1 | prev_next;
            }

            if bit_arr[j] & mask != 0 {
                let score = score_at(i, current_location, expected_location);

                if score <= current_threshold {
                    current_threshold = score;
                    best_score = score;
                    best_location = Some(current_location);

                    if current_location <= expected_location {
                        break;
                    }

                    // Past the expected location: never drift further on the other side
                    start = (2 * expected_location).saturating_sub(current_location).max(1);
                }
            }

            j -= 1;
        }

        // No higher error count can beat the current threshold
        if score_at(i + 1, expected_location, expected_location) > current_threshold {
            break;
        }

        last_bit_arr = bit_arr;
    }

    let mut result = SearchResult {
        is_match: best_location.is_some(),
        score: if best_location.is_some() {
            f64::max(MIN_FUZZY_SCORE, best_score)
        } else {
            1.0
        },
        ranges: Vec::new(),
    };

    if compute_matches {
        let ranges = mask_to_ranges(&match_mask, options.min_match_char_length);
        if ranges.is_empty() {
            result.is_match = false;
        } else if options.include_matches {
            result.ranges = ranges;
        }
    }

    Ok(result)
}
