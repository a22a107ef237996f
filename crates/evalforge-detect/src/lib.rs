//! Case/format detector: classifies a document, from its extracted
//! use cases and policies alone — never a filename, never the raw source —
//! into one `Case` and one-or-more `Format`s.

use evalforge_llm::{LlmBackend, Message, Role, call_structured};
use evalforge_model::{Case, Format, Policy, UseCase, schema::detection_response_schema};
use tracing::warn;

/// Result of case/format detection. `reasoning` is kept only for logs/
/// diagnostics, never consumed by downstream logic.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFormatDetection {
    pub case: Case,
    pub formats: Vec<Format>,
    pub reasoning: String,
}

/// Safe default returned whenever detection fails for any reason (API
/// error, empty formats, schema violation): falls back to
/// `(support_bot, ["single_turn_qa"])` and logs a warning.
#[must_use]
pub fn safe_default() -> CaseFormatDetection {
    CaseFormatDetection {
        case: Case::SupportBot,
        formats: vec![Format::SingleTurnQa],
        reasoning: "detection failed; using safe default".to_string(),
    }
}

const CLASSIFICATION_RULES: &str = "\
Classification rules (apply exactly one):\n\
- support_bot -> formats = [\"single_turn_qa\"]\n\
- operator_quality -> formats = [\"single_utterance_correction\", \"dialog_last_turn_correction\"] \
(always both, never just one)\n\
- doctor_booking -> formats = [\"single_turn_qa\"]";

fn build_prompt(use_cases: &[UseCase], policies: &[Policy]) -> Vec<Message> {
    let summary = serde_json::json!({
        "use_cases": use_cases.iter().map(|uc| serde_json::json!({
            "name": uc.name,
            "description": uc.description,
        })).collect::<Vec<_>>(),
        "policies": policies.iter().map(|p| serde_json::json!({
            "type": p.policy_type.to_string(),
            "description": p.description,
        })).collect::<Vec<_>>(),
    });
    let content = format!(
        "Classify the document that produced these extracted concepts. Do not \
         guess from a filename — none is given; classify from content alone.\n\n\
         {CLASSIFICATION_RULES}\n\nExtracted concepts:\n{}",
        serde_json::to_string_pretty(&summary).unwrap_or_default(),
    );
    vec![
        Message::system(
            "You classify requirements documents into a case and output \
             format set. Respond only with JSON matching the requested schema.",
        ),
        Message::new(Role::User, content),
    ]
}

fn parse_case(raw: &str) -> Option<Case> {
    match raw {
        "support_bot" => Some(Case::SupportBot),
        "operator_quality" => Some(Case::OperatorQuality),
        "doctor_booking" => Some(Case::DoctorBooking),
        _ => None,
    }
}

fn parse_format(raw: &str) -> Option<Format> {
    match raw {
        "single_turn_qa" => Some(Format::SingleTurnQa),
        "single_utterance_correction" => Some(Format::SingleUtteranceCorrection),
        "dialog_last_turn_correction" => Some(Format::DialogLastTurnCorrection),
        _ => None,
    }
}

/// Run detection. Never returns an error: any failure collapses to
/// [`safe_default`] with a logged warning.
pub async fn detect(
    backend: &dyn LlmBackend,
    use_cases: &[UseCase],
    policies: &[Policy],
    model: &str,
    seed: Option<u64>,
) -> CaseFormatDetection {
    let messages = build_prompt(use_cases, policies);
    let schema = detection_response_schema();

    let response = match call_structured(backend, "case_format_detector", model, messages, seed, &schema).await {
        Ok(r) => r,
        Err(error) => {
            warn!(%error, "case/format detection call failed, using safe default");
            return safe_default();
        }
    };

    let case = response
        .get("case")
        .and_then(|v| v.as_str())
        .and_then(parse_case);
    let formats: Vec<Format> = response
        .get("formats")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|f| f.as_str().and_then(parse_format)).collect())
        .unwrap_or_default();
    let reasoning = response
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let Some(case) = case else {
        warn!("case/format detection returned an unrecognized case, using safe default");
        return safe_default();
    };
    if formats.is_empty() {
        warn!("case/format detection returned no formats, using safe default");
        return safe_default();
    }

    // The pairing rule is authoritative regardless of what the model said
    // (fixed, not advisory): operator_quality always gets both correction
    // formats, the other two cases always get single_turn_qa only.
    let formats = case.default_formats();

    CaseFormatDetection {
        case,
        formats,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalforge_llm::{LlmInvocation, LlmResult};
    use evalforge_utils::error::LlmError;

    struct StubBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new(self.response.clone(), "stub", "stub-model"))
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::Transport("boom".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn operator_quality_always_gets_both_correction_formats() {
        let backend = StubBackend {
            response: serde_json::json!({
                "case": "operator_quality",
                "formats": ["single_utterance_correction"],
                "reasoning": "operator messages with errors"
            })
            .to_string(),
        };
        let detection = detect(&backend, &[], &[], "m", None).await;
        assert_eq!(detection.case, Case::OperatorQuality);
        assert!(detection.formats.contains(&Format::SingleUtteranceCorrection));
        assert!(detection.formats.contains(&Format::DialogLastTurnCorrection));
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_safe_default() {
        let detection = detect(&FailingBackend, &[], &[], "m", None).await;
        assert_eq!(detection, safe_default());
    }

    #[tokio::test]
    async fn unrecognized_case_falls_back_to_safe_default() {
        let backend = StubBackend {
            response: serde_json::json!({
                "case": "not_a_real_case",
                "formats": ["single_turn_qa"],
                "reasoning": "n/a"
            })
            .to_string(),
        };
        let detection = detect(&backend, &[], &[], "m", None).await;
        assert_eq!(detection, safe_default());
    }
}
