//! Conversion of per-character match masks into inclusive ranges

/// Inclusive `(start, end)` character range of a match
pub type MatchRange = (usize, usize);

/// Collapse a match mask into contiguous inclusive ranges.
///
/// Runs shorter than `min_match_char_length` are dropped, so short incidental
/// hits never surface even when the matcher counted them.
pub fn mask_to_ranges(match_mask: &[bool], min_match_char_length: usize) -> Vec<MatchRange> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &matched) in match_mask.iter().enumerate() {
        match (matched, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_match_char_length {
                    ranges.push((s, i - 1));
                }
                start = None;
            }
            _ => {}
        }
    }

    // Run reaching the end of the text
    if let Some(s) = start {
        if match_mask.len() - s >= min_match_char_length {
            ranges.push((s, match_mask.len() - 1));
        }
    }

    ranges
}
