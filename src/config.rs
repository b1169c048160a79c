//! Search options
//!
//! All options have defaults and can be set with the `with_*` builders or
//! loaded from JSON. Function-valued options (custom accessor, custom sort
//! order) are skipped by serde and must be set in code.

use crate::algorithms::{BitapOptions, TextNormalizer};
use crate::error::FuseError;
use crate::fuse::FuseResult;
use crate::indexing::{Accessor, KeySpec};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type CompareFn = dyn Fn(&FuseResult, &FuseResult) -> Ordering + Send + Sync;

/// Ordering applied to scored results
#[derive(Clone, Default)]
pub enum SortOrder {
    /// Ascending score, ties broken by ascending document position
    #[default]
    ByScoreThenIndex,
    Custom(Arc<CompareFn>),
}

impl SortOrder {
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&FuseResult, &FuseResult) -> Ordering + Send + Sync + 'static,
    {
        SortOrder::Custom(Arc::new(compare))
    }

    pub fn compare(&self, a: &FuseResult, b: &FuseResult) -> Ordering {
        match self {
            SortOrder::ByScoreThenIndex => a
                .score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_index.cmp(&b.doc_index)),
            SortOrder::Custom(compare) => compare(a, b),
        }
    }
}

impl fmt::Debug for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::ByScoreThenIndex => f.write_str("ByScoreThenIndex"),
            SortOrder::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options of a [`Fuse`](crate::Fuse) instance
#[derive(Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct FuseOptions<T> {
    // Match behavior
    /// Report matched character ranges in the results
    pub include_matches: bool,
    /// Keep scanning a text after a perfect match is found
    pub find_all_matches: bool,
    /// Minimum length of a matched run; shorter runs are dropped
    pub min_match_char_length: usize,

    // Basic behavior
    pub is_case_sensitive: bool,
    /// Compare text with accents and other combining marks removed
    pub ignore_diacritics: bool,
    /// Report the aggregated score in the results
    pub include_score: bool,
    /// Fields searched in structured documents
    pub keys: Vec<KeySpec<T>>,
    pub should_sort: bool,
    #[serde(skip)]
    pub sort: SortOrder,

    // Fuzziness
    /// Where in the text the pattern is expected to be found
    pub location: usize,
    /// 0.0 requires a perfect match, 1.0 matches anything
    pub threshold: f64,
    /// How far from `location` a match may be before it scores 1.0 on proximity alone
    pub distance: usize,

    // Advanced
    pub use_extended_search: bool,
    /// Shared field extractor, replaces [`Document::field`](crate::Document::field)
    #[serde(skip)]
    pub accessor: Option<Accessor<T>>,
    /// Score on edit errors only
    pub ignore_location: bool,
    /// Treat every field as one token long
    pub ignore_field_norm: bool,
    /// Exponent weight of the field-length norm
    pub field_norm_weight: f64,
    /// Value used in place of an exact 0.0 match score during aggregation
    pub score_floor: f64,
}

impl<T> Default for FuseOptions<T> {
    fn default() -> Self {
        Self {
            include_matches: false,
            find_all_matches: false,
            min_match_char_length: 1,
            is_case_sensitive: false,
            ignore_diacritics: false,
            include_score: false,
            keys: Vec::new(),
            should_sort: true,
            sort: SortOrder::default(),
            location: 0,
            threshold: 0.6,
            distance: 100,
            use_extended_search: false,
            accessor: None,
            ignore_location: false,
            ignore_field_norm: false,
            field_norm_weight: 1.0,
            // Smallest positive subnormal
            score_floor: 5e-324,
        }
    }
}

impl<T> FuseOptions<T> {
    /// Options searching the given fields, each with its relative weight
    pub fn with_weighted_keys<I, S>(weighted: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            keys: weighted
                .into_iter()
                .map(|(name, weight)| KeySpec::weighted(name, weight))
                .collect(),
            ..Default::default()
        }
    }

    /// Load options from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, FuseError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, FuseError> {
        let options: Self = serde_json::from_value(value)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeySpec<T>>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key(mut self, key: impl Into<KeySpec<T>>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_include_matches(mut self, include_matches: bool) -> Self {
        self.include_matches = include_matches;
        self
    }

    pub fn with_find_all_matches(mut self, find_all_matches: bool) -> Self {
        self.find_all_matches = find_all_matches;
        self
    }

    pub fn with_min_match_char_length(mut self, min_match_char_length: usize) -> Self {
        self.min_match_char_length = min_match_char_length;
        self
    }

    pub fn with_case_sensitive(mut self, is_case_sensitive: bool) -> Self {
        self.is_case_sensitive = is_case_sensitive;
        self
    }

    pub fn with_ignore_diacritics(mut self, ignore_diacritics: bool) -> Self {
        self.ignore_diacritics = ignore_diacritics;
        self
    }

    pub fn with_include_score(mut self, include_score: bool) -> Self {
        self.include_score = include_score;
        self
    }

    pub fn with_should_sort(mut self, should_sort: bool) -> Self {
        self.should_sort = should_sort;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_location(mut self, location: usize) -> Self {
        self.location = location;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_distance(mut self, distance: usize) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_extended_search(mut self, use_extended_search: bool) -> Self {
        self.use_extended_search = use_extended_search;
        self
    }

    pub fn with_accessor(mut self, accessor: Accessor<T>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_ignore_location(mut self, ignore_location: bool) -> Self {
        self.ignore_location = ignore_location;
        self
    }

    pub fn with_ignore_field_norm(mut self, ignore_field_norm: bool) -> Self {
        self.ignore_field_norm = ignore_field_norm;
        self
    }

    pub fn with_field_norm_weight(mut self, field_norm_weight: f64) -> Self {
        self.field_norm_weight = field_norm_weight;
        self
    }

    pub fn with_score_floor(mut self, score_floor: f64) -> Self {
        self.score_floor = score_floor;
        self
    }

    /// Check numeric options against their documented ranges
    pub fn validate(&self) -> Result<(), FuseError> {
        if !(self.threshold.is_finite() && (0.0..=1.0).contains(&self.threshold)) {
            return Err(FuseError::InvalidOption {
                name: "threshold",
                reason: format!("must be within [0.0, 1.0], got {}", self.threshold),
            });
        }
        if !(self.field_norm_weight.is_finite() && self.field_norm_weight >= 0.0) {
            return Err(FuseError::InvalidOption {
                name: "field_norm_weight",
                reason: format!("must be a non-negative finite number, got {}", self.field_norm_weight),
            });
        }
        if !(self.score_floor.is_finite() && self.score_floor > 0.0) {
            return Err(FuseError::InvalidOption {
                name: "score_floor",
                reason: format!("must be a positive finite number, got {}", self.score_floor),
            });
        }
        Ok(())
    }

    /// Matching parameters handed to the bitap engine
    pub fn bitap_options(&self) -> BitapOptions {
        BitapOptions {
            location: self.location,
            distance: self.distance,
            threshold: self.threshold,
            find_all_matches: self.find_all_matches,
            min_match_char_length: self.min_match_char_length,
            include_matches: self.include_matches,
            ignore_location: self.ignore_location,
            normalizer: TextNormalizer::new(self.is_case_sensitive, self.ignore_diacritics),
        }
    }
}

impl<T> Clone for FuseOptions<T> {
    fn clone(&self) -> Self {
        Self {
            include_matches: self.include_matches,
            find_all_matches: self.find_all_matches,
            min_match_char_length: self.min_match_char_length,
            is_case_sensitive: self.is_case_sensitive,
            ignore_diacritics: self.ignore_diacritics,
            include_score: self.include_score,
            keys: self.keys.clone(),
            should_sort: self.should_sort,
            sort: self.sort.clone(),
            location: self.location,
            threshold: self.threshold,
            distance: self.distance,
            use_extended_search: self.use_extended_search,
            accessor: self.accessor.clone(),
            ignore_location: self.ignore_location,
            ignore_field_norm: self.ignore_field_norm,
            field_norm_weight: self.field_norm_weight,
            score_floor: self.score_floor,
        }
    }
}

impl<T> fmt::Debug for FuseOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuseOptions")
            .field("include_matches", &self.include_matches)
            .field("find_all_matches", &self.find_all_matches)
            .field("min_match_char_length", &self.min_match_char_length)
            .field("is_case_sensitive", &self.is_case_sensitive)
            .field("ignore_diacritics", &self.ignore_diacritics)
            .field("include_score", &self.include_score)
            .field("keys", &self.keys)
            .field("should_sort", &self.should_sort)
            .field("sort", &self.sort)
            .field("location", &self.location)
            .field("threshold", &self.threshold)
            .field("distance", &self.distance)
            .field("use_extended_search", &self.use_extended_search)
            .field("accessor", &self.accessor)
            .field("ignore_location", &self.ignore_location)
            .field("ignore_field_norm", &self.ignore_field_norm)
            .field("field_norm_weight", &self.field_norm_weight)
            .field("score_floor", &self.score_floor)
            .finish()
    }
}
