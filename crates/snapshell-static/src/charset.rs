//! Character set to CSS `unicode-range` encoding.

use std::collections::BTreeSet;
use std::fmt::Write;

/// The exact set of Unicode codepoints an inlined font subset covers.
///
/// Rendered as a compact hexadecimal range string for the `unicode-range`
/// descriptor of an `@font-face` rule, so any character outside the set
/// falls back to the separately hosted full font file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterSet {
    codepoints: BTreeSet<u32>,
}

impl CharacterSet {
    /// Collect the unique codepoints of `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            codepoints: text.chars().map(|c| c as u32).collect(),
        }
    }

    /// Number of distinct codepoints in the set.
    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    /// Whether the set contains no codepoints.
    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }

    /// Encode the set as comma-separated hex ranges, e.g. `U+20,U+30-39`.
    ///
    /// Consecutive codepoints are merged into a single range; hex digits are
    /// lowercase.
    pub fn to_hex_range_string(&self) -> String {
        let mut out = String::new();

        let mut iter = self.codepoints.iter().copied();
        let Some(first) = iter.next() else {
            return out;
        };

        let mut start = first;
        let mut end = first;

        let mut flush = |out: &mut String, start: u32, end: u32| {
            if !out.is_empty() {
                out.push(',');
            }
            if start == end {
                let _ = write!(out, "U+{start:x}");
            } else {
                let _ = write!(out, "U+{start:x}-{end:x}");
            }
        };

        for cp in iter {
            if cp == end + 1 {
                end = cp;
            } else {
                flush(&mut out, start, end);
                start = cp;
                end = cp;
            }
        }
        flush(&mut out, start, end);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_consecutive_codepoints_into_ranges() {
        let set = CharacterSet::from_text("0123456789");
        assert_eq!(set.to_hex_range_string(), "U+30-39");
    }

    #[test]
    fn emits_singletons_and_ranges() {
        let set = CharacterSet::from_text(" 09AB");
        assert_eq!(set.to_hex_range_string(), "U+20,U+30,U+39,U+41-42");
    }

    #[test]
    fn deduplicates_repeated_characters() {
        let set = CharacterSet::from_text("AAAB");
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_hex_range_string(), "U+41-42");
    }

    #[test]
    fn empty_text_gives_empty_range() {
        let set = CharacterSet::from_text("");
        assert!(set.is_empty());
        assert_eq!(set.to_hex_range_string(), "");
    }

    #[test]
    fn hex_digits_are_lowercase() {
        let set = CharacterSet::from_text("\u{ff}");
        assert_eq!(set.to_hex_range_string(), "U+ff");
    }
}
