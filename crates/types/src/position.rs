//! Source locations: byte ranges for editing, line/column pairs for users.

/// Half-open byte range `start..end` into a source text.
///
/// Nodes, tokens, comments and fixes all carry one. Reported diagnostics
/// convert it to a [`Range`] through a [`LineIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetRange {
    pub start: usize,
    /// Exclusive
    pub end: usize,
}

impl OffsetRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty range at `offset`, the target of an insertion.
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `start <= end <= len`: the range can be sliced out of a text of
    /// `len` bytes.
    #[must_use]
    pub const fn is_valid_for(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

impl std::fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A location as JavaScript tooling reports it: 1-based line, 1-based
/// column counted in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end [`Position`] of a reported span; `end` is the position just
/// past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Line start table for one source text.
///
/// Every JavaScript line terminator starts a new line: `\n`, `\r\n`, a
/// lone `\r`, U+2028 and U+2029.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        line_starts.extend(text.char_indices().filter_map(|(i, c)| match c {
            '\n' => Some(i + 1),
            '\r' if bytes.get(i + 1) != Some(&b'\n') => Some(i + 1),
            '\u{2028}' | '\u{2029}' => Some(i + c.len_utf8()),
            _ => None,
        }));
        Self { line_starts }
    }

    /// 0-based line containing `offset`.
    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// Number of lines, counting an empty last line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Always `false`: empty text still has one line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }

    /// Position of byte `offset` in `text`.
    ///
    /// Offsets past the end clamp to the end. An offset inside a multi-byte
    /// character counts that character as passed.
    #[must_use]
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = self.line_of(offset);
        let line_start = self.line_starts[line];
        let column: usize = text[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .map(|(_, c)| c.len_utf16())
            .sum();

        Position::new(line as u32 + 1, column as u32 + 1)
    }

    #[must_use]
    pub fn range(&self, text: &str, range: OffsetRange) -> Range {
        Range::new(
            self.position(text, range.start),
            self.position(text, range.end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_ranges() {
        let insertion = OffsetRange::at(7);
        assert!(insertion.is_empty());
        assert_eq!(insertion.len(), 0);
        assert_eq!(insertion.to_string(), "7..7");
        assert_eq!(OffsetRange::new(4, 9).len(), 5);
    }

    #[test]
    fn test_ranges_must_fit_the_text() {
        let text = "a = b;";
        assert!(OffsetRange::new(0, 6).is_valid_for(text.len()));
        assert!(OffsetRange::at(6).is_valid_for(text.len()));
        assert!(!OffsetRange::new(2, 7).is_valid_for(text.len()));
        assert!(!OffsetRange::new(3, 1).is_valid_for(text.len()));
    }

    #[test]
    fn test_positions_order_by_line_then_column() {
        let mut positions = vec![
            Position::new(2, 1),
            Position::new(1, 12),
            Position::new(1, 3),
        ];
        positions.sort();
        assert_eq!(
            positions,
            [Position::new(1, 3), Position::new(1, 12), Position::new(2, 1)]
        );
        assert_eq!(Position::default().to_string(), "1:1");
    }

    #[test]
    fn test_every_line_terminator() {
        let text = "var a;\nvar b;\r\nvar c;\rd\u{2028}e";
        let index = LineIndex::new(text);
        assert_eq!(index.len(), 5);
        assert_eq!(index.position(text, 4), Position::new(1, 5));
        assert_eq!(index.position(text, 7), Position::new(2, 1));
        assert_eq!(index.position(text, 15), Position::new(3, 1));
        assert_eq!(index.position(text, 22), Position::new(4, 1));
        assert_eq!(index.position(text, 26), Position::new(5, 1));
    }

    #[test]
    fn test_columns_count_utf16_units() {
        // U+1F600 is four bytes and two UTF-16 units
        let text = "'\u{1F600}' + x";
        let index = LineIndex::new(text);
        assert_eq!(index.position(text, 6), Position::new(1, 5));
        assert_eq!(
            index.range(text, OffsetRange::new(0, text.len())),
            Range::new(Position::new(1, 1), Position::new(1, 9))
        );
    }

    #[test]
    fn test_offsets_past_the_end_clamp() {
        let text = "ab";
        assert_eq!(LineIndex::new(text).position(text, 99), Position::new(1, 3));
    }
}
