use std::ops::Range;

/// Source span information for a parsed node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpan {
    /// Line range in the original file (0-indexed, exclusive end)
    pub line_range: Range<usize>,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan {
            line_range: start..end,
        }
    }

    pub fn start(&self) -> usize {
        self.line_range.start
    }

    pub fn end(&self) -> usize {
        self.line_range.end
    }

    /// Grow the span so it covers lines up to (not including) `end`
    pub fn extend_to(&mut self, end: usize) {
        if end > self.line_range.end {
            self.line_range.end = end;
        }
    }
}
