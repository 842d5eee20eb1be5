//! Text replacement proposed by a rule.

use crate::OffsetRange;

/// A fix: replace `range` in the linted source with `text`.
///
/// Fixes use byte offsets into the exact source snapshot the rule saw. An
/// empty `text` deletes the range; an empty range inserts `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix {
    /// Byte offset range to replace
    pub range: OffsetRange,
    /// The text to replace the range with (empty string means deletion)
    pub text: String,
}

impl Fix {
    /// Create a fix that replaces a range with new text.
    #[must_use]
    pub fn replace(range: OffsetRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Create a deletion fix (replace range with empty string).
    #[must_use]
    pub fn remove(range: OffsetRange) -> Self {
        Self {
            range,
            text: String::new(),
        }
    }

    /// Create an insertion fix (insert text at an offset without removing anything).
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            range: OffsetRange::at(offset),
            text: text.into(),
        }
    }

    /// Returns `true` if this fix is a deletion (empty `text`).
    #[must_use]
    pub fn is_deletion(&self) -> bool {
        self.text.is_empty() && !self.range.is_empty()
    }

    /// Returns `true` if this fix is an insertion (zero-width range).
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.range.is_empty() && !self.text.is_empty()
    }

    /// Apply this fix alone to `source`.
    ///
    /// Returns `None` when the range is not valid for `source` or does not
    /// fall on character boundaries.
    #[must_use]
    pub fn apply(&self, source: &str) -> Option<String> {
        if !self.range.is_valid_for(source.len()) {
            return None;
        }
        let before = source.get(..self.range.start)?;
        let after = source.get(self.range.end..)?;
        let mut out = String::with_capacity(before.len() + self.text.len() + after.len());
        out.push_str(before);
        out.push_str(&self.text);
        out.push_str(after);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_replace() {
        let fix = Fix::replace(OffsetRange::new(10, 20), "replacement");
        assert_eq!(fix.range, OffsetRange::new(10, 20));
        assert_eq!(fix.text, "replacement");
        assert!(!fix.is_deletion());
        assert!(!fix.is_insertion());
    }

    #[test]
    fn test_fix_remove() {
        let fix = Fix::remove(OffsetRange::new(5, 15));
        assert_eq!(fix.text, "");
        assert!(fix.is_deletion());
        assert!(!fix.is_insertion());
    }

    #[test]
    fn test_fix_insert() {
        let fix = Fix::insert(10, "inserted text");
        assert_eq!(fix.range, OffsetRange::at(10));
        assert!(!fix.is_deletion());
        assert!(fix.is_insertion());
    }

    #[test]
    fn test_fix_apply() {
        let fix = Fix::replace(OffsetRange::new(8, 12), "x");
        assert_eq!(fix.apply("var a = 1234;").as_deref(), Some("var a = x;"));
        assert_eq!(Fix::insert(0, "/* */ ").apply("a").as_deref(), Some("/* */ a"));
    }

    #[test]
    fn test_fix_apply_rejects_bad_ranges() {
        assert_eq!(Fix::remove(OffsetRange::new(2, 1)).apply("abc"), None);
        assert_eq!(Fix::remove(OffsetRange::new(0, 4)).apply("abc"), None);
        // offset 1 is inside the two-byte 'é'
        assert_eq!(Fix::insert(1, "x").apply("é"), None);
    }
}
