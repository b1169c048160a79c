//! Field-length normalization
//!
//! Longer fields get a smaller norm, which softens the weight of a match found
//! inside them: `1 / tokens^(0.5 * weight)`, rounded to three decimals.

use ahash::AHashMap;

/// Build-scoped cache of norms by token count
#[derive(Debug, Clone)]
pub struct NormCache {
    weight: f64,
    scale: f64,
    cache: AHashMap<usize, f64>,
}

impl NormCache {
    pub fn new(weight: f64, mantissa: i32) -> Self {
        Self {
            weight,
            scale: 10f64.powi(mantissa),
            cache: AHashMap::new(),
        }
    }

    /// Norm of `value`, by its number of whitespace-separated tokens
    pub fn get(&mut self, value: &str) -> f64 {
        let tokens = value.split_whitespace().count();
        let (weight, scale) = (self.weight, self.scale);
        *self.cache.entry(tokens).or_insert_with(|| {
            let norm = 1.0 / (tokens as f64).powf(0.5 * weight);
            (norm * scale).round() / scale
        })
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Default for NormCache {
    fn default() -> Self {
        Self::new(1.0, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token() {
        let mut norm = NormCache::default();
        assert_eq!(norm.get("word"), 1.0);
    }

    #[test]
    fn test_inverse_sqrt() {
        let mut norm = NormCache::default();
        assert_eq!(norm.get("two words"), 0.707);
        assert_eq!(norm.get("  four   tokens in here "), 0.5);
    }

    #[test]
    fn test_weight_scales_exponent() {
        let mut norm = NormCache::new(2.0, 3);
        assert_eq!(norm.get("a b c d"), 0.25);

        let mut flat = NormCache::new(0.0, 3);
        assert_eq!(flat.get("a b c d e f"), 1.0);
    }

    #[test]
    fn test_cache_by_token_count() {
        let mut norm = NormCache::default();
        norm.get("one two");
        norm.get("three four");
        assert_eq!(norm.cached(), 1);
        norm.clear();
        assert_eq!(norm.cached(), 0);
    }
}
