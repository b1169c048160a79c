//! Combining per-field match scores into one document score
//!
//! Scores are multiplicative: each match contributes `score^(weight * norm)`,
//! so several good matches push a document closer to 0.0 while a poor match on
//! a heavily weighted field dominates the product.

use crate::fuse::{FuseMatch, FuseResult};
use crate::indexing::KeyStore;

/// Key weight used for matches without a key (plain string collections)
const DEFAULT_KEY_WEIGHT: f64 = 1.0;

/// Individual match score with its exponent factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Bitap score (0.0 - 1.0)
    pub score: f64,
    /// Normalized key weight
    pub weight: f64,
    /// Field-length norm
    pub norm: f64,
}

impl MatchScore {
    pub fn new(score: f64, weight: f64, norm: f64) -> Self {
        Self {
            score,
            weight,
            norm,
        }
    }

    /// This match's factor in the product.
    ///
    /// An exact 0.0 score is replaced by `floor`, otherwise `0^x` would erase
    /// every other match of the document.
    pub fn factor(&self, floor: f64) -> f64 {
        let base = if self.score == 0.0 && self.weight > 0.0 {
            floor
        } else {
            self.score
        };
        base.powf(self.weight * self.norm)
    }
}

/// Multiplicative scoring strategy
pub struct Multiplicative;

impl Multiplicative {
    /// Formula: Π(score_i ^ (weight_i × norm_i))
    ///
    /// An empty set combines to 1.0 (no evidence).
    pub fn combine(scores: &[MatchScore], floor: f64) -> f64 {
        scores.iter().map(|s| s.factor(floor)).product()
    }
}

/// Weight of a match, looked up by its key id
fn match_weight<T>(m: &FuseMatch, key_store: &KeyStore<T>) -> f64 {
    m.key
        .as_deref()
        .and_then(|id| key_store.weight(id))
        .unwrap_or(DEFAULT_KEY_WEIGHT)
}

/// Assign every candidate its aggregated score.
///
/// `ignore_field_norm` replaces every norm with 1.0.
pub fn score_results<T>(
    results: Vec<FuseResult>,
    key_store: &KeyStore<T>,
    ignore_field_norm: bool,
    floor: f64,
) -> Vec<FuseResult> {
    results
        .into_iter()
        .map(|result| {
            let scores: Vec<MatchScore> = result
                .matches
                .iter()
                .map(|m| {
                    let norm = if ignore_field_norm {
                        1.0
                    } else {
                        m.norm.unwrap_or(1.0)
                    };
                    MatchScore::new(m.score, match_weight(m, key_store), norm)
                })
                .collect();

            FuseResult {
                score: Multiplicative::combine(&scores, floor),
                ..result
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::KeySpec;

    const FLOOR: f64 = 5e-324;

    fn m(key: Option<&str>, score: f64, norm: f64) -> FuseMatch {
        FuseMatch {
            score,
            key: key.map(String::from),
            value: String::new(),
            array_index: None,
            norm: Some(norm),
            ranges: Vec::new(),
        }
    }

    fn candidate(matches: Vec<FuseMatch>) -> FuseResult {
        FuseResult {
            doc_index: 0,
            score: 1.0,
            matches,
        }
    }

    #[test]
    fn test_single_match_without_key() {
        let store = KeyStore::<String>::new(&[]).unwrap();
        let scored = score_results(vec![candidate(vec![m(None, 0.25, 1.0)])], &store, false, FLOOR);
        assert!((scored[0].score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_weight_and_norm_exponent() {
        let store = KeyStore::<String>::new(&[KeySpec::weighted("title", 1.0), KeySpec::weighted("body", 1.0)])
            .unwrap();
        let scored = score_results(
            vec![candidate(vec![m(Some("title"), 0.25, 0.5)])],
            &store,
            false,
            FLOOR,
        );
        // 0.25^(0.5 * 0.5)
        assert!((scored[0].score - 0.25f64.powf(0.25)).abs() < 1e-12);

        let ignored = score_results(
            vec![candidate(vec![m(Some("title"), 0.25, 0.5)])],
            &store,
            true,
            FLOOR,
        );
        assert!((ignored[0].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_product_over_matches() {
        let store = KeyStore::<String>::new(&[]).unwrap();
        let scored = score_results(
            vec![candidate(vec![m(None, 0.5, 1.0), m(None, 0.2, 1.0)])],
            &store,
            false,
            FLOOR,
        );
        assert!((scored[0].score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_exact_match_uses_floor() {
        let exact = MatchScore::new(0.0, 0.2, 1.0);
        let factor = exact.factor(FLOOR);
        assert!(factor > 0.0);
        assert!(factor < 1e-60);

        let zero_weight = MatchScore::new(0.0, 0.0, 1.0);
        assert_eq!(zero_weight.factor(FLOOR), 1.0);
    }

    #[test]
    fn test_unknown_key_defaults_to_unit_weight() {
        let store = KeyStore::<String>::new(&[KeySpec::name("title")]).unwrap();
        let scored = score_results(vec![candidate(vec![m(Some("other"), 0.3, 1.0)])], &store, false, FLOOR);
        assert!((scored[0].score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matches_combine_to_one() {
        assert_eq!(Multiplicative::combine(&[], FLOOR), 1.0);
    }
}
