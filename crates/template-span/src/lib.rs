//! Source positions for the template compiler.
//!
//! Every node and diagnostic produced by the compiler points back into the
//! template text with a [`Span`]. [`LineIndex`] turns those byte offsets into
//! human-facing line/column pairs for error reporting.

use std::ops::Range;

/// A half-open byte range `[start, end)` in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Build a span from `usize` byte offsets as produced by `str` APIs.
    pub fn from_range(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The covered text, or `""` if the span does not fit `source`.
    pub fn slice(self, source: &str) -> &str {
        source.get(self.to_range()).unwrap_or_default()
    }

    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    newlines: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let newlines = text.match_indices('\n').map(|(i, _)| i as u32).collect();
        Self {
            newlines,
            len: text.len() as u32,
        }
    }

    /// Zero-based line and column of `offset`, clamped to the end of the text.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self.newlines.partition_point(|&nl| nl < offset);
        let line_start = match line {
            0 => 0,
            n => self.newlines[n - 1] + 1,
        };
        LineCol::new(line as u32, offset - line_start)
    }

    pub fn lines(&self) -> usize {
        self.newlines.len() + 1
    }
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// One-based `(line, column)` as editors print it.
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_covers_both() {
        assert_eq!(Span::new(10, 20).merge(Span::new(15, 30)), Span::new(10, 30));
        assert_eq!(Span::new(15, 30).merge(Span::new(2, 4)), Span::new(2, 30));
        assert_eq!(Span::new(4, 9).len(), 5);
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_slice_out_of_bounds_is_empty() {
        let source = "<div>{{ msg }}</div>";
        assert_eq!(Span::new(8, 11).slice(source), "msg");
        assert_eq!(Span::from_range(5..14).slice(source), "{{ msg }}");
        assert_eq!(Span::new(30, 40).slice(source), "");
    }

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.lines(), 3);
        assert_eq!(index.line_col(0), LineCol::new(0, 0));
        assert_eq!(index.line_col(5), LineCol::new(0, 5));
        assert_eq!(index.line_col(6), LineCol::new(1, 0));
        assert_eq!(index.line_col(12), LineCol::new(2, 0));
        assert_eq!(index.line_col(99), LineCol::new(2, 3));
        assert_eq!(LineCol::new(1, 4).to_display(), (2, 5));
    }
}
