//! Runs every extracted [`Evidence`] item through
//! [`evalforge_model::check_against_source`] and collects warnings without
//! ever dropping the enclosing use case or policy: evidence failures never
//! remove the enclosing use case.

use evalforge_model::{Evidence, ValidationIssue, check_against_source};
use tracing::warn;

use crate::source::ParsedSource;

/// Check one evidence item against `source`, returning a warning `Issue` if
/// it is invalid or only fuzzily matched. `owner` is a human-readable label
/// (`"use case uc_001"`, `"policy pol_003"`) used in the warning message.
#[must_use]
pub fn check_one(evidence: &Evidence, source: &ParsedSource, owner: &str) -> Option<ValidationIssue> {
    let result = check_against_source(evidence, source.lines());
    match result {
        evalforge_model::EvidenceCheck::Exact => None,
        evalforge_model::EvidenceCheck::Fuzzy { similarity } => {
            let message = format!(
                "{owner}: evidence quote is a fuzzy match (similarity {similarity:.1}) against \
                 lines [{}, {}]",
                evidence.line_start, evidence.line_end
            );
            warn!(owner, similarity, "evidence fuzzy match");
            Some(ValidationIssue::new("evidence.fuzzy_match", message))
        }
        evalforge_model::EvidenceCheck::Invalid { reason } => {
            let message = format!("{owner}: evidence mismatch — {reason}");
            warn!(owner, reason = %reason, "evidence mismatch");
            Some(ValidationIssue::new("evidence.mismatch", message))
        }
    }
}

/// Check every evidence item belonging to `owner`, returning all warnings.
#[must_use]
pub fn check_all<'a>(
    evidence: impl IntoIterator<Item = &'a Evidence>,
    source: &ParsedSource,
    owner: &str,
) -> Vec<ValidationIssue> {
    evidence
        .into_iter()
        .filter_map(|e| check_one(e, source, owner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_quote_produces_no_warning() {
        let source = ParsedSource::from_text("doc.md", "hello world");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 1,
            quote: "hello world".to_string(),
        };
        assert!(check_one(&evidence, &source, "use case uc_001").is_none());
    }

    #[test]
    fn mismatched_quote_produces_warning_not_error() {
        let source = ParsedSource::from_text("doc.md", "hello world");
        let evidence = Evidence {
            input_file: "doc.md".to_string(),
            line_start: 1,
            line_end: 1,
            quote: "completely unrelated text here".to_string(),
        };
        let warning = check_one(&evidence, &source, "use case uc_001").unwrap();
        assert_eq!(warning.code, "evidence.mismatch");
    }
}
