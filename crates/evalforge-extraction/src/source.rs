//! Source reader: reads the source document as UTF-8, normalizes
//! line endings, and splits into a 0-indexed, immutable line array shared
//! read-only by every downstream component.

use std::path::{Path, PathBuf};

use evalforge_utils::error::PipelineError;

/// An immutable, already-split view of the source document. Once
/// constructed, nothing downstream mutates it — the extractor, detector,
/// and evidence validator all read the same `lines` slice.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    path: PathBuf,
    lines: Vec<String>,
}

impl ParsedSource {
    /// Read `path` as UTF-8, normalize CRLF -> LF, and split into lines with
    /// the line terminator stripped (trailing whitespace within a line is
    /// preserved).
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let normalized = raw.replace("\r\n", "\n");
        let lines = normalized.lines().map(str::to_string).collect();
        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// Build directly from in-memory text, for tests and embedders that
    /// already have the document loaded.
    #[must_use]
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        Self {
            path: path.into(),
            lines: normalized.lines().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The document text with `"<n>: "` 1-based line-number prefixes — this
    /// prefixed form, not the raw source, is what gets handed to the LLM so
    /// line numbers are observable to the model.
    #[must_use]
    pub fn with_line_prefixes(&self) -> String {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_is_normalized_to_lf() {
        let source = ParsedSource::from_text("doc.md", "one\r\ntwo\r\nthree");
        assert_eq!(source.lines(), &["one", "two", "three"]);
    }

    #[test]
    fn line_prefixes_are_1_based() {
        let source = ParsedSource::from_text("doc.md", "alpha\nbeta");
        assert_eq!(source.with_line_prefixes(), "1: alpha\n2: beta");
    }

    #[test]
    fn trailing_whitespace_within_a_line_is_preserved() {
        let source = ParsedSource::from_text("doc.md", "has trailing   \nnext");
        assert_eq!(source.lines()[0], "has trailing   ");
    }

    #[test]
    fn read_missing_file_is_source_io_error() {
        let err = ParsedSource::read("/nonexistent/path/does-not-exist.md");
        assert!(matches!(err, Err(PipelineError::SourceIo(_))));
    }
}
