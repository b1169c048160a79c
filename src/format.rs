//! Projection of scored results into their returned shape

use crate::algorithms::MatchRange;
use crate::fuse::FuseResult;
use serde::Serialize;

/// One matched field of a result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedMatch {
    /// Inclusive character ranges that matched
    pub indices: Vec<MatchRange>,
    pub value: String,
    /// Key id, absent for plain string collections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Position within the source array for array-valued fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_index: Option<usize>,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedResult<'a, T> {
    pub item: &'a T,
    /// Position of `item` in the collection
    pub ref_index: usize,
    /// Present only with `include_matches`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<FormattedMatch>>,
    /// Present only with `include_score`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

fn format_matches(result: &FuseResult) -> Vec<FormattedMatch> {
    result
        .matches
        .iter()
        .filter(|m| !m.ranges.is_empty())
        .map(|m| FormattedMatch {
            indices: m.ranges.clone(),
            value: m.value.clone(),
            key: m.key.clone(),
            ref_index: m.array_index,
        })
        .collect()
}

/// Resolve each result against `docs` and attach the requested details.
///
/// Matches without ranges are left out.
pub fn format<'a, T>(
    results: &[FuseResult],
    docs: &'a [T],
    include_matches: bool,
    include_score: bool,
) -> Vec<FormattedResult<'a, T>> {
    results
        .iter()
        .filter_map(|result| {
            let item = docs.get(result.doc_index)?;
            Some(FormattedResult {
                item,
                ref_index: result.doc_index,
                matches: include_matches.then(|| format_matches(result)),
                score: include_score.then_some(result.score),
            })
        })
        .collect()
}
