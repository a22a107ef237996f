//! Source classifier (`support_bot` only): assigns
//! `metadata.source ∈ {tickets, faq_paraphrase, corner}` to a generated
//! example. Two cheap heuristics short-circuit the common cases; the
//! remainder goes to a structured LLM call that defaults to `tickets` on any
//! failure, since that is the least specific, safest label.

use evalforge_llm::{LlmBackend, Message as LlmMessage, Role as LlmRole, call_structured};
use evalforge_model::{Source, TestCase, UseCase, schema::source_classification_response_schema};

fn adversarial_value(test_case: &TestCase) -> Option<String> {
    test_case
        .parameters
        .get("adversarial")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn parse_source(value: &str) -> Option<Source> {
    match value {
        "tickets" => Some(Source::Tickets),
        "faq_paraphrase" => Some(Source::FaqParaphrase),
        "corner" => Some(Source::Corner),
        _ => None,
    }
}

/// Classify one example's provenance. Never fails: any LLM
/// error or malformed response falls back to `tickets`.
pub async fn classify(
    backend: &dyn LlmBackend,
    use_case: &UseCase,
    test_case: &TestCase,
    model: &str,
    seed: Option<u64>,
) -> Source {
    if let Some(adversarial) = adversarial_value(test_case)
        && matches!(adversarial.as_str(), "profanity" | "injection" | "garbage")
    {
        return Source::Corner;
    }

    let is_none_adversarial = adversarial_value(test_case).as_deref() == Some("none");
    if is_none_adversarial && use_case.description.to_lowercase().contains("faq") {
        return Source::FaqParaphrase;
    }

    let schema = source_classification_response_schema();
    let messages = vec![
        LlmMessage::system(
            "Classify the likely provenance of a support-bot evaluation \
             example. Respond only with JSON matching the requested schema.",
        ),
        LlmMessage::new(
            LlmRole::User,
            format!(
                "Use case: {}\nDescription: {}\nTest case: {}\n\nClassify \
                 this example's source as one of: tickets (a real support \
                 ticket), faq_paraphrase (a paraphrase of a FAQ entry), \
                 corner (an edge case probing robustness).",
                use_case.name, use_case.description, test_case.name,
            ),
        ),
    ];

    match call_structured(backend, "source_classifier", model, messages, seed, &schema).await {
        Ok(response) => response
            .get("source")
            .and_then(|v| v.as_str())
            .and_then(parse_source)
            .unwrap_or(Source::Tickets),
        Err(_) => Source::Tickets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalforge_llm::LlmInvocation;
    use evalforge_utils::error::LlmError;
    use std::collections::BTreeMap;

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

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<evalforge_llm::LlmResult, LlmError> {
            Err(LlmError::Transport("down".to_string()))
        }
        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    fn use_case(description: &str) -> UseCase {
        UseCase {
            id: "uc_001".to_string(),
            case: evalforge_model::Case::SupportBot,
            name: "n".to_string(),
            description: description.to_string(),
            evidence: vec![],
        }
    }

    fn test_case(adversarial: &str) -> TestCase {
        let mut parameters = BTreeMap::new();
        parameters.insert("adversarial".to_string(), serde_json::json!(adversarial));
        TestCase {
            id: "tc_001".to_string(),
            case: evalforge_model::Case::SupportBot,
            use_case_id: "uc_001".to_string(),
            name: "tc".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["adversarial".to_string(), "tone".to_string()],
            parameters,
            policy_ids: vec![],
        }
    }

    #[tokio::test]
    async fn adversarial_parameter_forces_corner() {
        let backend = StubBackend {
            response: serde_json::json!({"source": "tickets", "confidence": 0.9}).to_string(),
        };
        let source = classify(&backend, &use_case("x"), &test_case("injection"), "m", None).await;
        assert_eq!(source, Source::Corner);
    }

    #[tokio::test]
    async fn faq_description_with_no_adversarial_is_faq_paraphrase() {
        let backend = StubBackend {
            response: serde_json::json!({"source": "tickets", "confidence": 0.9}).to_string(),
        };
        let source = classify(&backend, &use_case("Answering FAQ about refunds"), &test_case("none"), "m", None).await;
        assert_eq!(source, Source::FaqParaphrase);
    }

    #[tokio::test]
    async fn llm_failure_defaults_to_tickets() {
        let backend = FailingBackend;
        let source = classify(&backend, &use_case("General order question"), &test_case("none"), "m", None).await;
        assert_eq!(source, Source::Tickets);
    }

    #[tokio::test]
    async fn llm_success_uses_classified_label() {
        let backend = StubBackend {
            response: serde_json::json!({"source": "faq_paraphrase", "confidence": 0.8}).to_string(),
        };
        let source = classify(&backend, &use_case("General order question"), &test_case("none"), "m", None).await;
        assert_eq!(source, Source::FaqParaphrase);
    }
}
