//! Global offset addressing across a multi-file snapshot.
//!
//! Every file in a snapshot is assigned a disjoint global byte range;
//! a single ordered offset space is then enough to reason about
//! containment across the whole project. The table maps any global
//! offset back to its owning file and 1-based line/column.

use carto_core::{Position, Range};

use crate::locate::Span;

/// Shared addressing table for one snapshot.
///
/// Files are registered in snapshot order; file `i` owns global
/// offsets `[base, base + len]` and the next file starts at
/// `base + len + 1`, so ranges never touch.
#[derive(Debug, Default)]
pub struct PositionTable {
    entries: Vec<FileEntry>,
}

#[derive(Debug)]
struct FileEntry {
    path: String,
    base: usize,
    len: usize,
    /// Byte offset of the start of each line, local to the file.
    line_starts: Vec<usize>,
}

impl PositionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its assigned base offset.
    pub(crate) fn add_file(&mut self, path: &str, source: &str) -> usize {
        let base = self
            .entries
            .last()
            .map(|e| e.base + e.len + 1)
            .unwrap_or(0);
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        self.entries.push(FileEntry {
            path: path.to_string(),
            base,
            len: source.len(),
            line_starts,
        });
        base
    }

    fn entry_at(&self, offset: usize) -> Option<&FileEntry> {
        let idx = self.entries.partition_point(|e| e.base <= offset);
        if idx == 0 {
            return None;
        }
        let entry = &self.entries[idx - 1];
        (offset <= entry.base + entry.len).then_some(entry)
    }

    /// The path of the file owning `offset`, if any.
    pub fn file_at(&self, offset: usize) -> Option<&str> {
        self.entry_at(offset).map(|e| e.path.as_str())
    }

    /// Map a global offset to its file and 1-based line/column.
    pub fn position(&self, offset: usize) -> Option<(&str, Position)> {
        let entry = self.entry_at(offset)?;
        let local = offset - entry.base;
        let line_idx = entry.line_starts.partition_point(|&s| s <= local) - 1;
        let position = Position {
            line: (line_idx + 1) as u32,
            column: (local - entry.line_starts[line_idx] + 1) as u32,
        };
        Some((entry.path.as_str(), position))
    }

    /// Render a resolved global span back to a file range.
    pub fn range(&self, span: Span) -> Option<Range> {
        let (file, start) = self.position(span.start)?;
        let (_, end) = self.position(span.end)?;
        Some(Range {
            file: file.to_string(),
            start,
            end,
        })
    }

    /// The degenerate fallback range for an unresolved location: the
    /// offset's own point, one column wide.
    pub fn point_range(&self, offset: usize) -> Option<Range> {
        let (file, at) = self.position(offset)?;
        Some(Range::point(file, at))
    }
}
