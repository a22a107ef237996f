//! [`Evidence`] — a verifiable citation pairing a quote with a 1-based line
//! range in the source document.

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use crate::issue::ValidationIssue;

/// A quote paired with the line range of the source document it was taken
/// from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    pub input_file: String,
    pub line_start: usize,
    pub line_end: usize,
    pub quote: String,
}

impl Evidence {
    /// Structural checks only (non-empty quote, ordered range, range ≥ 1).
    /// Does *not* check the quote against source text — that requires the
    /// source's line array and is done by [`check_against_source`].
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.quote.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "evidence.empty_quote",
                "evidence quote must be non-empty",
            ));
        }
        if self.line_start < 1 {
            issues.push(ValidationIssue::new(
                "evidence.line_start",
                "line_start must be >= 1",
            ));
        }
        if self.line_end < self.line_start {
            issues.push(ValidationIssue::new(
                "evidence.line_order",
                format!(
                    "line_end ({}) must be >= line_start ({})",
                    self.line_end, self.line_start
                ),
            ));
        }
        issues
    }
}

/// Outcome of checking an [`Evidence`] quote against the source document's
/// line range.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceCheck {
    /// Exact match after whitespace normalization.
    Exact,
    /// Character-level similarity `>= 90` but not an exact match.
    Fuzzy { similarity: f64 },
    /// Out of range, or similarity `< 90`.
    Invalid { reason: String },
}

impl EvidenceCheck {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }

    #[must_use]
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Self::Fuzzy { .. })
    }
}

/// Right-strip trailing whitespace from each line, CRLF already normalized
/// away by the source reader.
fn normalize_for_comparison(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end().replace('\r', ""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Character-level similarity in `[0, 100]`, computed as normalized
/// Levenshtein similarity scaled up from `[0, 1]`.
#[must_use]
pub fn similarity_score(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// The minimum similarity (inclusive) at which a non-exact quote is still
/// accepted as valid evidence.
pub const FUZZY_THRESHOLD: f64 = 90.0;

/// Check `evidence` against the 0-indexed `lines` of its source document.
#[must_use]
pub fn check_against_source(evidence: &Evidence, lines: &[String]) -> EvidenceCheck {
    if evidence.line_start < 1 || evidence.line_end > lines.len() {
        return EvidenceCheck::Invalid {
            reason: format!(
                "line range [{}, {}] out of bounds for a {}-line document",
                evidence.line_start,
                evidence.line_end,
                lines.len()
            ),
        };
    }

    let start_idx = evidence.line_start - 1;
    let end_idx = evidence.line_end;
    let actual_raw = lines[start_idx..end_idx].join("\n");
    let actual = normalize_for_comparison(&actual_raw);
    let normalized_quote = normalize_for_comparison(&evidence.quote);

    if actual == normalized_quote {
        return EvidenceCheck::Exact;
    }

    let similarity = similarity_score(&actual, &normalized_quote);
    if similarity >= FUZZY_THRESHOLD {
        return EvidenceCheck::Fuzzy { similarity };
    }

    EvidenceCheck::Invalid {
        reason: format!(
            "quote does not match source (similarity {similarity:.1} < {FUZZY_THRESHOLD}); \
             expected {actual:?}, got {normalized_quote:?}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn exact_match_is_valid() {
        let src = lines("first line\nsecond line\nthird line");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 2,
            quote: "first line\nsecond line".to_string(),
        };
        assert_eq!(check_against_source(&evidence, &src), EvidenceCheck::Exact);
    }

    #[test]
    fn trailing_pipe_omission_is_fuzzy_not_invalid() {
        let src = lines("| name | value |\n| a | b |");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 1,
            quote: "| name | value".to_string(),
        };
        let result = check_against_source(&evidence, &src);
        assert!(result.is_fuzzy(), "expected fuzzy match, got {result:?}");
    }

    #[test]
    fn completely_different_quote_is_invalid() {
        let src = lines("the quick brown fox jumps over the lazy dog");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 1,
            quote: "something entirely unrelated to this sentence".to_string(),
        };
        let result = check_against_source(&evidence, &src);
        assert!(!result.is_valid());
    }

    #[test]
    fn out_of_range_is_invalid() {
        let src = lines("only one line");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 5,
            quote: "only one line".to_string(),
        };
        let result = check_against_source(&evidence, &src);
        assert!(matches!(result, EvidenceCheck::Invalid { .. }));
    }

    #[test]
    fn trailing_whitespace_and_crlf_are_ignored() {
        let src = lines("line one  \nline two");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 2,
            quote: "line one\r\nline two  ".to_string(),
        };
        assert_eq!(check_against_source(&evidence, &src), EvidenceCheck::Exact);
    }
}
