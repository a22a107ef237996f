//! `single_utterance_correction` adapter: a single operator
//! utterance, corrected in isolation, `target_message_index = 0`.

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

pub struct SingleUtteranceCorrectionAdapter;

fn build_prompt(use_case: &UseCase, policies: &[Policy], test_case: &TestCase) -> Vec<LlmMessage> {
    let content = format!(
        "Generate one realistic, imperfect operator utterance (per the test \
         case's phrasing/punctuation/slang/aggression parameters) and its \
         corrected form.\n\n{}\n\n{}\n\n{}\n\nThe `messages` array must \
         contain exactly one message with role \"operator\" holding the raw, \
         uncorrected utterance. `expected_output` is the corrected \
         utterance.{}",
        render_context(use_case, policies),
        test_case_summary(test_case),
        common_invariants_text(),
        mixed_errors_directive(&test_case.parameters),
    );
    vec![
        LlmMessage::system(
            "You generate single-utterance correction evaluation examples. \
             Respond only with JSON matching the requested schema.",
        ),
        LlmMessage::new(LlmRole::User, content),
    ]
}

#[async_trait]
impl FormatAdapter for SingleUtteranceCorrectionAdapter {
    async fn generate_example(
        &self,
        backend: &dyn LlmBackend,
        use_case: &UseCase,
        policies: &[Policy],
        test_case: &TestCase,
        example_id: String,
        model: &str,
        seed: Option<u64>,
        _escalation_sentence: &str,
    ) -> Result<DatasetExample, LlmError> {
        let messages = build_prompt(use_case, policies, test_case);
        let schema = dataset_example_response_schema();
        let response = call_structured(
            backend,
            "single_utterance_correction_adapter",
            model,
            messages,
            seed,
            &schema,
        )
        .await?;
        let parsed = parse_response(&response);

        let operator_message = parsed
            .messages
            .into_iter()
            .find(|m| m.role == Role::Operator)
            .unwrap_or_else(|| Message::new(Role::Operator, "ну незнаю что вам сказать"));

        let mut metadata = BTreeMap::new();
        metadata.insert("generator".to_string(), serde_json::json!("format_adapter"));
        metadata.insert(
            "parameters".to_string(),
            serde_json::to_value(&test_case.parameters).unwrap_or_default(),
        );

        Ok(DatasetExample {
            id: example_id,
            case: use_case.case,
            format: evalforge_model::Format::SingleUtteranceCorrection,
            use_case_id: use_case.id.clone(),
            test_case_id: test_case.id.clone(),
            input: InputData {
                messages: vec![operator_message],
                target_message_index: Some(0),
            },
            expected_output: parsed.expected_output,
            evaluation_criteria: parsed.evaluation_criteria,
            policy_ids: parsed.policy_ids,
            metadata,
        })
    }

    fn validate_format(&self, example: &DatasetExample) -> Vec<ValidationIssue> {
        example.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalforge_llm::LlmInvocation;
    use std::collections::BTreeMap as Map;

    struct StubBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<evalforge_llm::LlmResult, LlmError> {
            Ok(evalforge_llm::LlmResult::new(self.response.clone(), "stub", "m"))
        }
        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    fn use_case() -> UseCase {
        UseCase {
            id: "uc_001".to_string(),
            case: evalforge_model::Case::OperatorQuality,
            name: "Operator phrasing".to_string(),
            description: "Operator message correction".to_string(),
            evidence: vec![],
        }
    }

    fn test_case() -> TestCase {
        TestCase {
            id: "tc_001".to_string(),
            case: evalforge_model::Case::OperatorQuality,
            use_case_id: "uc_001".to_string(),
            name: "tc".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["punctuation_errors".to_string(), "medical_terms".to_string()],
            parameters: Map::new(),
            policy_ids: vec!["pol_001".to_string()],
        }
    }

    #[tokio::test]
    async fn produces_single_operator_message_with_index_zero() {
        let backend = StubBackend {
            response: serde_json::json!({
                "messages": [{"role": "operator", "content": "ну незнаю чо сказать вам"}],
                "expected_output": "Извините, я уточню информацию.",
                "evaluation_criteria": ["a", "b", "c"],
                "policy_ids": ["pol_001"]
            })
            .to_string(),
        };
        let adapter = SingleUtteranceCorrectionAdapter;
        let example = adapter
            .generate_example(&backend, &use_case(), &[], &test_case(), "ex_001".to_string(), "m", None, "")
            .await
            .unwrap();
        assert_eq!(example.input.messages.len(), 1);
        assert_eq!(example.input.messages[0].role, Role::Operator);
        assert_eq!(example.input.target_message_index, Some(0));
        assert!(adapter.validate_format(&example).is_empty());
    }

    #[test]
    fn prompt_instructs_mixed_errors_for_non_default_parameters() {
        let mut tc = test_case();
        tc.parameters.insert("punctuation_errors".to_string(), serde_json::json!("severe"));
        tc.parameters.insert("slang_profanity_emoji".to_string(), serde_json::json!("excessive"));
        let messages = build_prompt(&use_case(), &[], &tc);
        let content = &messages[1].content;
        assert!(content.contains("never one error type in isolation"));
        assert!(content.contains("punctuation_errors=severe"));
        assert!(content.contains("slang_profanity_emoji=excessive"));
    }
}
