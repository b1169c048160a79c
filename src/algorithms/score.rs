//! Match score combining edit errors with location proximity
//!
//! Lower is better. 0.0 is a perfect match at the expected location.

/// Score a candidate match.
///
/// * `pattern_len` - Length of the (chunk) pattern in characters
/// * `errors` - Edit errors allowed for this match
/// * `current_location` - Where the match was found
/// * `expected_location` - Where the match was expected
/// * `distance` - How far from `expected_location` a match may drift before the
///   proximity term alone reaches 1.0
/// * `ignore_location` - Score on accuracy alone
#[inline]
pub fn compute_score(
    pattern_len: usize,
    errors: usize,
    current_location: usize,
    expected_location: usize,
    distance: usize,
    ignore_location: bool,
) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;

    if ignore_location {
        return accuracy;
    }

    let proximity = expected_location.abs_diff(current_location);

    if distance == 0 {
        // No drift allowed: any displacement is a full miss
        return if proximity != 0 { 1.0 } else { accuracy };
    }

    accuracy + proximity as f64 / distance as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_score() {
        assert_eq!(compute_score(5, 0, 0, 0, 100, false), 0.0);
    }

    #[test]
    fn test_accuracy_only_when_ignoring_location() {
        assert_eq!(compute_score(4, 1, 50, 0, 100, true), 0.25);
    }

    #[test]
    fn test_proximity_term() {
        // 1/4 errors + 10/100 displacement
        let score = compute_score(4, 1, 10, 0, 100, false);
        assert!((score - 0.35).abs() < 1e-12);

        // Distance is symmetric
        let left = compute_score(4, 0, 0, 10, 100, false);
        let right = compute_score(4, 0, 20, 10, 100, false);
        assert_eq!(left, right);
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(compute_score(4, 1, 3, 0, 0, false), 1.0);
        assert_eq!(compute_score(4, 1, 0, 0, 0, false), 0.25);
    }

    #[test]
    fn test_score_can_exceed_one() {
        assert!(compute_score(2, 1, 200, 0, 100, false) > 1.0);
    }
}
