//! Hard-coded (LLM-free) mapping from a supplementary engine's or the
//! direct fallback's raw JSON example into the format-specific structural
//! shape every `DatasetExample` must carry. Mirrors the structural-
//! enforcement approach each format adapter in `evalforge-formats` already
//! takes for its own generation path.

use evalforge_model::{Format, InputData, Message, Policy, Role};
use regex::Regex;

/// Parse a raw example (shaped like [`evalforge_model::schema::dataset_example_response_schema`])
/// and force its message shape to satisfy `format`'s structural invariants,
/// exactly as the dedicated per-format adapters do for their own calls.
#[must_use]
pub fn coerce_raw_example(
    raw: &serde_json::Value,
    format: Format,
) -> (InputData, String, Vec<String>, Vec<String>) {
    let parsed = evalforge_formats::prompt_common::parse_response(raw);
    let expected_output = parsed.expected_output;
    let criteria = parsed.evaluation_criteria;
    let policy_ids = parsed.policy_ids;

    let input = match format {
        Format::SingleTurnQa => {
            let user_message = parsed
                .messages
                .into_iter()
                .find(|m| m.role == Role::User)
                .unwrap_or_else(|| Message::new(Role::User, "Здравствуйте, у меня вопрос."));
            InputData {
                messages: vec![user_message],
                target_message_index: None,
            }
        }
        Format::SingleUtteranceCorrection => {
            let operator_message = parsed
                .messages
                .into_iter()
                .find(|m| m.role == Role::Operator)
                .unwrap_or_else(|| Message::new(Role::Operator, "ну я не знаю как объяснить"));
            InputData {
                messages: vec![operator_message],
                target_message_index: Some(0),
            }
        }
        Format::DialogLastTurnCorrection => {
            let mut dialog = parsed.messages;
            if dialog.is_empty() {
                dialog.push(Message::new(Role::User, "Здравствуйте, у меня проблема."));
            }
            if dialog.last().is_none_or(|m| m.role != Role::Operator) {
                dialog.push(Message::new(Role::Operator, "сейчас посмотрю что можно сделать"));
            }
            let target_index = dialog.len().saturating_sub(1);
            InputData {
                messages: dialog,
                target_message_index: Some(target_index),
            }
        }
    };

    (input, expected_output, criteria, policy_ids)
}

/// Recover any `pol_*` ids mentioned in `raw`'s free text (description,
/// messages, expected output) that resolve to a known policy, beyond
/// whatever the engine already put in its own `policy_ids` field.
#[must_use]
pub fn extract_referenced_policy_ids(
    raw: &serde_json::Value,
    policy_id_pattern: &Regex,
    policies: &[Policy],
) -> Vec<String> {
    let known: std::collections::HashSet<&str> = policies.iter().map(|p| p.id.as_str()).collect();
    let haystack = raw.to_string();
    let mut found: Vec<String> = policy_id_pattern
        .find_iter(&haystack)
        .map(|m| m.as_str().to_string())
        .filter(|id| known.contains(id.as_str()))
        .collect();
    found.sort();
    found.dedup();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalforge_model::{Case, PolicyType};

    fn policies() -> Vec<Policy> {
        vec![Policy {
            id: "pol_001".to_string(),
            case: Case::SupportBot,
            policy_type: PolicyType::Must,
            statement: "s".to_string(),
            description: "d".to_string(),
            evidence: vec![],
        }]
    }

    #[test]
    fn single_utterance_coercion_forces_operator_and_index_zero() {
        let raw = serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "expected_output": "corrected",
            "evaluation_criteria": ["a", "b", "c"],
            "policy_ids": []
        });
        let (input, _, _, _) = coerce_raw_example(&raw, Format::SingleUtteranceCorrection);
        assert_eq!(input.messages.len(), 1);
        assert_eq!(input.messages[0].role, evalforge_model::Role::Operator);
        assert_eq!(input.target_message_index, Some(0));
    }

    #[test]
    fn extracts_known_policy_ids_mentioned_in_context() {
        let raw = serde_json::json!({"expected_output": "see pol_001 for details"});
        let regex = Regex::new(r"pol_[A-Za-z0-9_]+").unwrap();
        let ids = extract_referenced_policy_ids(&raw, &regex, &policies());
        assert_eq!(ids, vec!["pol_001".to_string()]);
    }
}
