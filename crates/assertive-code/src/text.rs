//! Line-indexed access to source text.
//!
//! Token spans report positions as `(line, column)` pairs where lines are
//! **1-indexed** and columns are **0-indexed counts of chars**. `LineIndex`
//! turns those into byte offsets so each expression can keep the exact
//! source slice it was parsed from.
//!
//! Positions outside the text are clamped: a line past the end maps to the
//! end of the text, a column past the end of its line maps to the line end.

use proc_macro2::LineColumn;

/// Precomputed line starts for one source file.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { text, line_starts }
    }

    /// Byte offset of the first char of a 1-indexed line.
    ///
    /// Line 0 is treated as line 1.
    pub fn line_start(&self, line: u32) -> Option<usize> {
        let idx = line.max(1) as usize - 1;
        self.line_starts.get(idx).copied()
    }

    /// Convert a span position to a byte offset.
    pub fn offset(&self, position: LineColumn) -> usize {
        let Some(start) = self.line_start(position.line as u32) else {
            return self.text.len();
        };
        let end = self.line_end(start);
        self.text[start..end]
            .char_indices()
            .nth(position.column)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    /// The source text between two span positions.
    pub fn slice(&self, start: LineColumn, end: LineColumn) -> &'a str {
        let from = self.offset(start);
        let to = self.offset(end).max(from);
        &self.text[from..to]
    }

    fn line_end(&self, start: usize) -> usize {
        self.text[start..]
            .find('\n')
            .map(|p| start + p)
            .unwrap_or(self.text.len())
    }
}
