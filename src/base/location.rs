//! Source text positions, ranges, and containment geometry.

use std::fmt;

use super::FilePath;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    /// Create a new LineCol position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create from 1-indexed line and column (as displayed to users).
    #[inline]
    pub const fn from_one_indexed(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// A half-open 2-D range over a file's text.
///
/// Lines and columns are 0-indexed. The range covers everything from
/// `(start_line, start_col)` to `(end_line, end_col)`; on interior lines
/// the full line width belongs to the range, columns only constrain the
/// first and last line.
#[derive(Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// The file this range lies in.
    pub file: FilePath,
    /// 0-indexed first line.
    pub start_line: u32,
    /// 0-indexed column on the first line.
    pub start_col: u32,
    /// 0-indexed last line.
    pub end_line: u32,
    /// 0-indexed column on the last line.
    pub end_col: u32,
}

impl Location {
    /// Create a new Location.
    pub fn new(
        file: impl Into<FilePath>,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        Self {
            file: file.into(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// The position where this range starts.
    #[inline]
    pub const fn start(&self) -> LineCol {
        LineCol::new(self.start_line, self.start_col)
    }

    /// The position where this range ends.
    #[inline]
    pub const fn end(&self) -> LineCol {
        LineCol::new(self.end_line, self.end_col)
    }

    /// True iff `target` lies within this range.
    ///
    /// Boundary lines are inclusive; column comparison only applies on the
    /// first and last line. Reflexive: every location contains itself.
    pub fn contains(&self, target: &Location) -> bool {
        if self.file != target.file {
            return false;
        }
        if target.start_line < self.start_line || target.end_line > self.end_line {
            return false;
        }
        if target.start_line == self.start_line && target.start_col < self.start_col {
            return false;
        }
        if target.end_line == self.end_line && target.end_col > self.end_col {
            return false;
        }
        true
    }

    /// Derive the lookup key for this location.
    ///
    /// Injective over (file, start_line, start_col, end_line, end_col):
    /// the four numeric fields form the tail of the key, so paths that
    /// themselves contain `:` never collide.
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.file, self.start_line, self.start_col, self.end_line, self.end_col
        )
    }

    /// Parse a key produced by [`Location::key`] back into a Location.
    ///
    /// Returns `None` if the tail of the key is not four numeric fields.
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.rsplitn(5, ':');
        let end_col = parts.next()?.parse().ok()?;
        let end_line = parts.next()?.parse().ok()?;
        let start_col = parts.next()?.parse().ok()?;
        let start_line = parts.next()?.parse().ok()?;
        let file = parts.next()?;
        Some(Self {
            file: FilePath::from(file),
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.file, self.start(), self.end())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start())
    }
}

/// Index for converting byte offsets to line/column positions.
///
/// Front ends that produce byte offsets use this to construct [`Location`]s;
/// the resolution core itself works on line/column pairs throughout.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push((offset + 1) as u32);
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }

    /// Convert a line/column position to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<u32> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        Some(line_start + line_col.col)
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines (empty file).
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}
