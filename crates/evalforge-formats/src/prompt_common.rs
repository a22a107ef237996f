//! Shared prompt-building helpers used by every format adapter.

use evalforge_model::{AxisValue, Policy, TestCase, UseCase};
use std::collections::BTreeMap;

/// Render a use case and its applicable policies as context text, generic
/// across cases — no case-specific few-shot examples, ever.
#[must_use]
pub fn render_context(use_case: &UseCase, policies: &[Policy]) -> String {
    let policy_lines: Vec<String> = policies
        .iter()
        .map(|p| format!("- [{}] ({}) {}", p.id, p.policy_type, p.statement))
        .collect();
    format!(
        "Use case: {}\nDescription: {}\n\nApplicable policies:\n{}",
        use_case.name,
        use_case.description,
        policy_lines.join("\n")
    )
}

/// Every axis value in `parameters` that is *not* the axis's default,
/// rendered as `axis=value` pairs — used to instruct "mixed errors" content:
/// include all non-default parameter values simultaneously.
#[must_use]
pub fn non_default_parameters(parameters: &BTreeMap<String, AxisValue>) -> Vec<(String, String)> {
    parameters
        .iter()
        .filter(|(_, v)| !crate::axes::Axis::is_default_value(v))
        .map(|(k, v)| (k.clone(), v.to_string().trim_matches('"').to_string()))
        .collect()
}

/// Render the "mixed errors" directive operator-correction adapters must
/// include: every non-default parameter value named explicitly and combined
/// into the same utterance, never one error type in isolation. Returns an
/// empty string if every parameter is at its default (no mixing to instruct).
#[must_use]
pub fn mixed_errors_directive(parameters: &BTreeMap<String, AxisValue>) -> String {
    let non_default = non_default_parameters(parameters);
    if non_default.is_empty() {
        return String::new();
    }
    let listed: Vec<String> = non_default.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!(
        "\n\nMixed errors: the operator utterance must exhibit ALL of the \
         following non-default parameter values simultaneously, combined in \
         the same utterance — never one error type in isolation: {}.",
        listed.join(", ")
    )
}

/// The common closing invariants every format adapter's prompt states.
#[must_use]
pub fn common_invariants_text() -> &'static str {
    "Output constraints:\n\
     - write all conversational content and the expected output in Russian\n\
     - produce at least 3 evaluation_criteria\n\
     - reference at least 1 applicable policy id in policy_ids\n\
     - never invent policy ids that were not listed above"
}

#[must_use]
pub fn test_case_summary(test_case: &TestCase) -> String {
    format!(
        "Test case: {}\nVariation axes: {}\nParameters: {}",
        test_case.name,
        test_case.parameter_variation_axes.join(", "),
        serde_json::to_string(&test_case.parameters).unwrap_or_default(),
    )
}

/// Parse the common dataset-example response fields shared by every
/// adapter's structured call (messages/expected_output/evaluation_criteria/
/// policy_ids) — the format-specific shape (message count, roles,
/// `target_message_index`) is then imposed by each adapter itself rather
/// than trusted from the model — the adapter is the source of truth for
/// structural invariants, the model only supplies content.
pub struct ParsedResponse {
    pub messages: Vec<evalforge_model::Message>,
    pub expected_output: String,
    pub evaluation_criteria: Vec<String>,
    pub policy_ids: Vec<String>,
}

#[must_use]
pub fn parse_response(value: &serde_json::Value) -> ParsedResponse {
    let messages = value
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|m| serde_json::from_value(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default();
    let expected_output = value
        .get("expected_output")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let evaluation_criteria = value
        .get("evaluation_criteria")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let policy_ids = value
        .get("policy_ids")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|p| p.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    ParsedResponse {
        messages,
        expected_output,
        evaluation_criteria,
        policy_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_default_parameters_skips_defaults() {
        let mut params = BTreeMap::new();
        params.insert("tone".to_string(), json!("aggressive"));
        params.insert("language".to_string(), json!("ru"));
        let non_default = non_default_parameters(&params);
        assert_eq!(non_default, vec![("tone".to_string(), "aggressive".to_string())]);
    }

    #[test]
    fn mixed_errors_directive_names_every_non_default_value() {
        let mut params = BTreeMap::new();
        params.insert("punctuation_errors".to_string(), json!("severe"));
        params.insert("slang_profanity_emoji".to_string(), json!("excessive"));
        params.insert("medical_terms".to_string(), json!("none"));
        let directive = mixed_errors_directive(&params);
        assert!(directive.contains("never one error type in isolation"));
        assert!(directive.contains("punctuation_errors=severe"));
        assert!(directive.contains("slang_profanity_emoji=excessive"));
        assert!(!directive.contains("medical_terms"));
    }

    #[test]
    fn mixed_errors_directive_empty_when_all_default() {
        let mut params = BTreeMap::new();
        params.insert("tone".to_string(), json!("neutral"));
        assert_eq!(mixed_errors_directive(&params), String::new());
    }
}
