//! Policy extractor: like the use-case extractor, plus an explicit
//! decision tree the prompt instructs the model to execute before emitting
//! `type` — precedence matters, special cases before the general `must`.

use evalforge_llm::{LlmBackend, Message, Role, call_structured};
use evalforge_model::{Policy, PolicyType, ValidationIssue, make_id, schema::policies_response_schema};
use evalforge_utils::error::LlmError;
use tracing::info;

use crate::evidence_check::check_all;
use crate::source::ParsedSource;
use crate::use_case::UNDETECTED_CASE;

const DECISION_TREE: &str = "\
Classify each policy's `type` by executing this decision tree IN ORDER \
(stop at the first match):\n\
1. Is it a prohibition (\"must not\", \"never\", \"forbidden\")? -> must_not\n\
2. Otherwise, does it trigger escalation to a human? -> escalate\n\
3. Otherwise, is it a communication tone/language rule? -> style\n\
4. Otherwise, is it an output-structure rule? -> format\n\
5. Otherwise -> must\n\
\n\
Special cases (must_not, escalate, style, format) are checked before the \
general case (must) — never classify something as `must` if an earlier \
rule in the tree also applies. Aim for at least 2 distinct types across all \
extracted policies.";

fn build_prompt(source: &ParsedSource, minimum_count: usize) -> Vec<Message> {
    let task = serde_json::json!({
        "objective": "extract operational policies from a Russian-language requirements document",
        "minimum_count": minimum_count,
        "id_format": "pol_NNN",
        "content_language": "Russian",
        "evidence_accuracy": "CHARACTER-EXACT",
    });
    let content = format!(
        "{}\n\nDecision tree for `type`:\n{}\n\nEvidence rules: preserve all \
         Markdown punctuation and whitespace verbatim, take line numbers from \
         the \"<n>: \" prefixes, never include the prefix in the quote itself, \
         join multi-line quotes with a single newline.\n\nSource document \
         (line-numbered):\n{}",
        serde_json::to_string_pretty(&task).unwrap_or_default(),
        DECISION_TREE,
        source.with_line_prefixes(),
    );
    vec![
        Message::system(
            "You extract structured operational policies from requirements \
             documents. Respond only with JSON matching the requested schema.",
        ),
        Message::new(Role::User, content),
    ]
}

fn parse_policy_type(raw: &str) -> PolicyType {
    match raw {
        "must_not" => PolicyType::MustNot,
        "escalate" => PolicyType::Escalate,
        "style" => PolicyType::Style,
        "format" => PolicyType::Format,
        _ => PolicyType::Must,
    }
}

/// Extract policies from `source` via one structured call. `statement` is
/// back-filled from `description` when the model left it blank.
pub async fn extract_policies(
    backend: &dyn LlmBackend,
    source: &ParsedSource,
    model: &str,
    seed: Option<u64>,
    minimum_count: usize,
) -> Result<(Vec<Policy>, Vec<ValidationIssue>), LlmError> {
    let messages = build_prompt(source, minimum_count);
    let schema = policies_response_schema();
    let response = call_structured(backend, "policy_extractor", model, messages, seed, &schema)
        .await?;

    let raw_policies = response
        .get("policies")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut policies = Vec::with_capacity(raw_policies.len());
    let mut warnings = Vec::new();

    for (index, raw) in raw_policies.into_iter().enumerate() {
        let policy_type = raw
            .get("type")
            .and_then(|v| v.as_str())
            .map(parse_policy_type)
            .unwrap_or(PolicyType::Must);
        let statement = raw
            .get("statement")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let description = raw
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let evidence: Vec<evalforge_model::Evidence> = raw
            .get("evidence")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|e| serde_json::from_value(e.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| s.starts_with(evalforge_model::POLICY_PREFIX))
            .map(str::to_string)
            .unwrap_or_else(|| make_id(evalforge_model::POLICY_PREFIX, index + 1));

        let owner = format!("policy {id}");
        warnings.extend(check_all(&evidence, source, &owner));

        let mut policy = Policy {
            id,
            case: UNDETECTED_CASE,
            policy_type,
            statement,
            description,
            evidence,
        };
        policy.backfill_statement();
        policies.push(policy);
    }

    info!(count = policies.len(), "extracted policies");
    Ok((policies, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalforge_llm::LlmInvocation;

    struct StubBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn invoke(
            &self,
            _inv: LlmInvocation,
        ) -> Result<evalforge_llm::LlmResult, LlmError> {
            Ok(evalforge_llm::LlmResult::new(
                self.response.clone(),
                "stub",
                "stub-model",
            ))
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn blank_statement_is_backfilled_from_description() {
        let source = ParsedSource::from_text("doc.md", "Оператор не должен грубить клиенту.");
        let backend = StubBackend {
            response: serde_json::json!({
                "policies": [{
                    "id": "pol_001",
                    "type": "must_not",
                    "statement": "",
                    "description": "Оператор не должен грубить клиенту.",
                    "evidence": [{
                        "input_file": "doc.md",
                        "line_start": 1,
                        "line_end": 1,
                        "quote": "Оператор не должен грубить клиенту."
                    }]
                }]
            })
            .to_string(),
        };
        let (policies, _) = extract_policies(&backend, &source, "m", None, 1)
            .await
            .unwrap();
        assert_eq!(policies[0].statement, policies[0].description);
        assert_eq!(policies[0].policy_type, PolicyType::MustNot);
    }

    #[test]
    fn unknown_type_defaults_to_must() {
        assert_eq!(parse_policy_type("bogus"), PolicyType::Must);
    }
}
