//! Text normalization applied identically to patterns and searched text
//!
//! Two independent steps: lowercasing (unless case-sensitive) and diacritic
//! stripping (canonical decomposition, then dropping combining marks).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalization settings for one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNormalizer {
    /// Keep the original case
    pub case_sensitive: bool,
    /// Strip accents and other combining marks
    pub ignore_diacritics: bool,
}

impl TextNormalizer {
    pub fn new(case_sensitive: bool, ignore_diacritics: bool) -> Self {
        Self {
            case_sensitive,
            ignore_diacritics,
        }
    }

    /// Normalize a string according to these settings
    #[must_use]
    pub fn apply<'a>(&self, s: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(s);
        if !self.case_sensitive {
            out = Cow::Owned(out.to_lowercase());
        }
        if self.ignore_diacritics {
            out = Cow::Owned(strip_diacritics(&out));
        }
        out
    }

    /// Normalize and split into characters, the unit the matcher indexes by
    pub fn chars(&self, s: &str) -> Vec<char> {
        self.apply(s).chars().collect()
    }
}

/// Remove diacritics: "Crème Brûlée" -> "Creme Brulee"
#[must_use]
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase() {
        let n = TextNormalizer::default();
        assert_eq!(n.apply("Hello World"), "hello world");
    }

    #[test]
    fn test_case_sensitive_is_borrowed() {
        let n = TextNormalizer::new(true, false);
        assert!(matches!(n.apply("Hello"), Cow::Borrowed("Hello")));
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Crème Brûlée"), "Creme Brulee");
        assert_eq!(strip_diacritics("naïve café"), "naive cafe");
        assert_eq!(strip_diacritics("plain"), "plain");
    }

    #[test]
    fn test_combined() {
        let n = TextNormalizer::new(false, true);
        assert_eq!(n.apply("ÉCOLE"), "ecole");
        assert_eq!(n.chars("Åb"), vec!['a', 'b']);
    }
}
