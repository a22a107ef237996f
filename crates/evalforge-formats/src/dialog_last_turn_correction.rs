//! `dialog_last_turn_correction` adapter: a multi-turn dialog ending on an
//! operator utterance, corrected in context, `target_message_index`
//! pointing at the final message. Carries the escalation-sentence
//! invariant: when `escalation_needed = yes`, the corrected utterance must
//! contain the canonical escalation sentence verbatim.

use std::collections::BTreeMap;

use async_trait::async_trait;
use evalforge_llm::{LlmBackend, Message as LlmMessage, Role as LlmRole, call_structured};
use evalforge_model::{
    DatasetExample, InputData, Message, Policy, Role, TestCase, UseCase, ValidationIssue,
    schema::dataset_example_response_schema,
};
use evalforge_utils::error::LlmError;

use crate::adapter::FormatAdapter;
use crate::prompt_common::{
    common_invariants_text, mixed_errors_directive, parse_response, render_context,
    test_case_summary,
};

pub struct DialogLastTurnCorrectionAdapter;

fn escalation_needed(test_case: &TestCase) -> bool {
    test_case
        .parameters
        .get("escalation_needed")
        .and_then(|v| v.as_str())
        .map(|v| v == "yes")
        .unwrap_or(false)
}

fn build_prompt(
    use_case: &UseCase,
    policies: &[Policy],
    test_case: &TestCase,
    escalation_sentence: &str,
) -> Vec<LlmMessage> {
    let escalation_note = if escalation_needed(test_case) {
        format!(
            "\n\nThis case requires escalation. The corrected final operator \
             utterance (`expected_output`) must contain the following \
             sentence verbatim: \"{escalation_sentence}\"."
        )
    } else {
        String::new()
    };
    let content = format!(
        "Generate a short realistic dialog (2-4 prior turns between user and \
         operator/assistant) ending in an imperfect operator utterance, and \
         the corrected form of that final utterance.\n\n{}\n\n{}\n\n{}\n\nThe \
         `messages` array must hold the full dialog in order and the last \
         message must have role \"operator\". `expected_output` is the \
         corrected form of that last message alone.{}{}",
        render_context(use_case, policies),
        test_case_summary(test_case),
        common_invariants_text(),
        mixed_errors_directive(&test_case.parameters),
        escalation_note,
    );
    vec![
        LlmMessage::system(
            "You generate multi-turn dialog-correction evaluation examples. \
             Respond only with JSON matching the requested schema.",
        ),
        LlmMessage::new(LlmRole::User, content),
    ]
}

#[async_trait]
impl FormatAdapter for DialogLastTurnCorrectionAdapter {
    async fn generate_example(
        &self,
        backend: &dyn LlmBackend,
        use_case: &UseCase,
        policies: &[Policy],
        test_case: &TestCase,
        example_id: String,
        model: &str,
        seed: Option<u64>,
        escalation_sentence: &str,
    ) -> Result<DatasetExample, LlmError> {
        let messages = build_prompt(use_case, policies, test_case, escalation_sentence);
        let schema = dataset_example_response_schema();
        let response = call_structured(
            backend,
            "dialog_last_turn_correction_adapter",
            model,
            messages,
            seed,
            &schema,
        )
        .await?;
        let parsed = parse_response(&response);

        let mut dialog = parsed.messages;
        if dialog.last().is_none_or(|m| m.role != Role::Operator) {
            dialog.push(Message::new(Role::Operator, "в общем я разберусь с этим вопросом"));
        }
        let target_index = dialog.len().saturating_sub(1);

        let needs_escalation = escalation_needed(test_case);
        let mut expected_output = parsed.expected_output;
        if needs_escalation && !expected_output.contains(escalation_sentence) {
            if expected_output.trim().is_empty() {
                expected_output = escalation_sentence.to_string();
            } else {
                expected_output = format!("{expected_output} {escalation_sentence}");
            }
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("generator".to_string(), serde_json::json!("format_adapter"));
        metadata.insert(
            "parameters".to_string(),
            serde_json::to_value(&test_case.parameters).unwrap_or_default(),
        );
        if needs_escalation {
            metadata.insert("escalation_sentence".to_string(), serde_json::json!(escalation_sentence));
        }

        Ok(DatasetExample {
            id: example_id,
            case: use_case.case,
            format: evalforge_model::Format::DialogLastTurnCorrection,
            use_case_id: use_case.id.clone(),
            test_case_id: test_case.id.clone(),
            input: InputData {
                messages: dialog,
                target_message_index: Some(target_index),
            },
            expected_output,
            evaluation_criteria: parsed.evaluation_criteria,
            policy_ids: parsed.policy_ids,
            metadata,
        })
    }

    /// In addition to the base structural invariants, enforce the
    /// escalation-sentence invariant by reading back the sentence stashed
    /// into `metadata` at generation time — `DatasetExample` alone
    /// does not carry `TestCase.parameters`, so the adapter records what it
    /// needs to re-check later.
    fn validate_format(&self, example: &DatasetExample) -> Vec<ValidationIssue> {
        let mut issues = example.validate();
        if let Some(sentence) = example.metadata.get("escalation_sentence").and_then(|v| v.as_str())
            && !example.expected_output.contains(sentence)
        {
            issues.push(ValidationIssue::new(
                "example.missing_escalation_sentence",
                format!(
                    "example {} requires escalation but its expected_output \
                     does not contain the canonical escalation sentence",
                    example.id
                ),
            ));
        }
        issues
    }
}
