//! Region resolution: coarse positional hints → exact document ranges.
//!
//! Checkers usually report problems as a 1-based line and (sometimes) column.
//! [`RegionResolver`] turns that hint into a concrete half-open char range
//! against a document snapshot:
//!
//! - Without a column, the region covers the line's content with indentation
//!   and trailing whitespace skipped; a blank line extends to the start of the
//!   following line so the region stays visible.
//! - With a column, the resolver asks a [`TokenScanner`] for the end of the
//!   token starting there. The precise column is honored only when that
//!   extension succeeds; otherwise the whole-line fallback applies, including
//!   its indentation-skip begin.
//!
//! Resolution never panics; malformed snapshots surface as [`RegionError`]
//! and the caller is expected to log and drop the diagnostic.

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::snapshot::SnapshotSource;

/// Faults during region resolution.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// The snapshot reported zero lines.
    #[error("document snapshot has no lines")]
    EmptySnapshot,
    /// The snapshot refused a line it claimed to contain.
    #[error("snapshot has no line {line}")]
    MalformedSnapshot {
        /// The 0-based line index that failed to resolve.
        line: usize,
    },
}

/// Finds the end of the smallest token beginning at a column hint.
///
/// Implementations get the line's text (no trailing newline) and the 0-based
/// char offset of the hint within that line, and return the exclusive char
/// offset of the token's end — or `None` when no token starts there, which
/// makes the resolver fall back to the whole-line region.
pub trait TokenScanner: Send + Sync {
    /// Token end (exclusive, char offset within the line) for a token at
    /// `begin_in_line`, or `None`.
    fn token_end(&self, line_text: &str, begin_in_line: usize) -> Option<usize>;
}

/// Default scanner: extends across the unicode word containing the hint.
///
/// Segments that contain no alphanumeric character (whitespace, lone
/// punctuation) are not treated as tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordScanner;

impl TokenScanner for WordScanner {
    fn token_end(&self, line_text: &str, begin_in_line: usize) -> Option<usize> {
        let mut char_pos = 0;
        for (_, segment) in line_text.split_word_bound_indices() {
            let segment_end = char_pos + segment.chars().count();
            if begin_in_line < segment_end {
                if segment.chars().any(|c| c.is_alphanumeric() || c == '_') {
                    return Some(segment_end);
                }
                return None;
            }
            char_pos = segment_end;
        }
        None
    }
}

/// Converts a (line, optional column) hint into a half-open char range.
pub struct RegionResolver {
    scanner: Box<dyn TokenScanner>,
}

impl RegionResolver {
    /// Create a resolver with the default [`WordScanner`].
    pub fn new() -> Self {
        Self::with_scanner(Box::new(WordScanner))
    }

    /// Create a resolver with a host-supplied token scanner.
    pub fn with_scanner(scanner: Box<dyn TokenScanner>) -> Self {
        Self { scanner }
    }

    /// Resolve a 1-based `line` and optional 1-based `column` against a
    /// snapshot.
    ///
    /// `line` is clamped to the snapshot's line range. A column of `0` is
    /// treated as absent. The returned range always satisfies
    /// `start <= end`.
    pub fn resolve<S: SnapshotSource + ?Sized>(
        &self,
        snapshot: &S,
        line: usize,
        column: Option<usize>,
    ) -> Result<Range<usize>, RegionError> {
        let line_count = snapshot.line_count();
        if line_count == 0 {
            return Err(RegionError::EmptySnapshot);
        }

        let line_index = line.clamp(1, line_count) - 1;
        let missing = RegionError::MalformedSnapshot { line: line_index };
        let line_start = snapshot.line_to_char(line_index).ok_or(missing)?;
        let text = snapshot.line_text(line_index).ok_or(missing)?;
        let line_len = text.chars().count();

        if let Some(column) = column.filter(|&c| c > 0) {
            let begin_in_line = (column - 1).min(line_len);
            if let Some(token_end) = self.scanner.token_end(&text, begin_in_line) {
                if token_end > begin_in_line {
                    return Ok(line_start + begin_in_line..line_start + token_end);
                }
            }
            // No token at the hinted column: fall back to the whole-line
            // region, including its indentation-skip begin.
        }

        let indent = text.chars().take_while(|c| c.is_whitespace()).count();
        let trimmed = text.trim_end().chars().count();
        let begin = line_start + indent;
        let end = if trimmed > indent {
            line_start + trimmed
        } else {
            // Blank line: extend to the start of the following line so the
            // region is at least one character wide when a next line exists.
            snapshot.line_to_char(line_index + 1).unwrap_or(begin)
        };

        Ok(begin..end)
    }
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DocumentSnapshot;

    /// A scanner that never finds a token, forcing the whole-line fallback.
    struct NoToken;

    impl TokenScanner for NoToken {
        fn token_end(&self, _line_text: &str, _begin_in_line: usize) -> Option<usize> {
            None
        }
    }

    #[test]
    fn test_line_without_column_trims_indentation_and_trailing_whitespace() {
        let snapshot = DocumentSnapshot::from_text("x = 1\n  y = 2  \n");
        let resolver = RegionResolver::new();

        // Line 2 is "  y = 2  ": skip the 2-char indent, trim the trailing blanks.
        let region = resolver.resolve(&snapshot, 2, None).unwrap();
        assert_eq!(region, 8..13);
    }

    #[test]
    fn test_column_without_token_falls_back_to_indentation_begin() {
        let snapshot = DocumentSnapshot::from_text("x = 1\n  y = 2\n");
        let resolver = RegionResolver::with_scanner(Box::new(NoToken));

        // Column 3 points at "y", but with no resolvable token the region is
        // the trimmed line, starting at the indentation end — not at column 3.
        let region = resolver.resolve(&snapshot, 2, Some(3)).unwrap();
        assert_eq!(region, 8..13);
    }

    #[test]
    fn test_column_with_token_extends_to_token_end() {
        let snapshot = DocumentSnapshot::from_text("let value = 1;\n");
        let resolver = RegionResolver::new();

        // Column 5 points at the start of "value".
        let region = resolver.resolve(&snapshot, 1, Some(5)).unwrap();
        assert_eq!(region, 4..9);
    }

    #[test]
    fn test_column_inside_token_keeps_begin_extends_to_end() {
        let snapshot = DocumentSnapshot::from_text("let value = 1;\n");
        let resolver = RegionResolver::new();

        // Column 7 is the "l" inside "value": begin stays there, the end is
        // still the word's end.
        let region = resolver.resolve(&snapshot, 1, Some(7)).unwrap();
        assert_eq!(region, 6..9);
    }

    #[test]
    fn test_blank_line_extends_to_next_line_start() {
        let snapshot = DocumentSnapshot::from_text("a\n   \nb\n");
        let resolver = RegionResolver::new();

        // Line 2 is "   ": begin is the indentation end, end is line 3's start.
        let region = resolver.resolve(&snapshot, 2, None).unwrap();
        assert_eq!(region, 5..6);
        assert!(region.end >= region.start);
    }

    #[test]
    fn test_blank_last_line_yields_degenerate_region() {
        let snapshot = DocumentSnapshot::from_text("a\n");
        let resolver = RegionResolver::new();

        // The trailing newline creates an empty final line with nothing after it.
        let region = resolver.resolve(&snapshot, 2, None).unwrap();
        assert_eq!(region, 2..2);
    }

    #[test]
    fn test_out_of_range_line_is_clamped() {
        let snapshot = DocumentSnapshot::from_text("only line");
        let resolver = RegionResolver::new();

        let region = resolver.resolve(&snapshot, 99, None).unwrap();
        assert_eq!(region, 0..9);

        let region = resolver.resolve(&snapshot, 0, None).unwrap();
        assert_eq!(region, 0..9);
    }

    #[test]
    fn test_column_past_line_end_is_clamped() {
        let snapshot = DocumentSnapshot::from_text("abc\n");
        let resolver = RegionResolver::new();

        let region = resolver.resolve(&snapshot, 1, Some(50)).unwrap();
        // Clamped to the line end, no token there, whole-line fallback.
        assert_eq!(region, 0..3);
    }

    #[test]
    fn test_zero_column_is_treated_as_absent() {
        let snapshot = DocumentSnapshot::from_text("  abc\n");
        let resolver = RegionResolver::new();

        let region = resolver.resolve(&snapshot, 1, Some(0)).unwrap();
        assert_eq!(region, 2..5);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let snapshot = DocumentSnapshot::from_text("fn main() {\n    body();\n}\n");
        let resolver = RegionResolver::new();

        let first = resolver.resolve(&snapshot, 2, Some(5)).unwrap();
        for _ in 0..3 {
            assert_eq!(resolver.resolve(&snapshot, 2, Some(5)).unwrap(), first);
        }
    }

    #[test]
    fn test_word_scanner_ignores_punctuation() {
        let scanner = WordScanner;
        // "x = 1": offset 1 is the space, offset 2 is "=".
        assert_eq!(scanner.token_end("x = 1", 0), Some(1));
        assert_eq!(scanner.token_end("x = 1", 1), None);
        assert_eq!(scanner.token_end("x = 1", 2), None);
        assert_eq!(scanner.token_end("x = 1", 4), Some(5));
        assert_eq!(scanner.token_end("x = 1", 9), None);
    }
}
