//! Document snapshots for region resolution.
//!
//! Producers and the region resolver never see the live, mutable document;
//! they work against an immutable [`DocumentSnapshot`] captured when a check
//! cycle starts. The snapshot is rope-backed, so cloning one to hand to a
//! producer thread is cheap.
//!
//! All public offsets are **character offsets** (not bytes), matching the
//! convention used by [`crate::Diagnostic`] ranges.

use ropey::Rope;

/// Read access the region resolver needs from a document snapshot.
///
/// [`DocumentSnapshot`] is the standard implementation; the trait exists so
/// hosts with their own buffer representation can resolve regions without
/// copying text into a rope first.
pub trait SnapshotSource {
    /// Total number of lines (an empty document has one empty line).
    fn line_count(&self) -> usize;

    /// Text of the 0-based line, without its trailing newline.
    ///
    /// Returns `None` when `line_index` is out of range.
    fn line_text(&self, line_index: usize) -> Option<String>;

    /// Char offset of the first character of the 0-based line.
    ///
    /// Returns `None` when `line_index` is out of range.
    fn line_to_char(&self, line_index: usize) -> Option<usize>;

    /// Total character count of the document.
    fn char_count(&self) -> usize;
}

/// Immutable rope-backed snapshot of a document's text.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    rope: Rope,
}

impl DocumentSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Text of the 0-based line, without its trailing newline.
    pub fn line_text(&self, line_index: usize) -> Option<String> {
        if line_index >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line_index).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Char offset of the start of the 0-based line.
    pub fn line_to_char(&self, line_index: usize) -> Option<usize> {
        if line_index >= self.rope.len_lines() {
            return None;
        }
        Some(self.rope.line_to_char(line_index))
    }
}

impl SnapshotSource for DocumentSnapshot {
    fn line_count(&self) -> usize {
        self.line_count()
    }

    fn line_text(&self, line_index: usize) -> Option<String> {
        self.line_text(line_index)
    }

    fn line_to_char(&self, line_index: usize) -> Option<usize> {
        self.line_to_char(line_index)
    }

    fn char_count(&self) -> usize {
        self.char_count()
    }
}
