//! Direct structured-LLM fallback: invoked only when the
//! supplementary engines still leave a use case short. A single call
//! produces the remaining examples directly; no tool selection, no
//! persona — just the same structured-call contract every other component
//! in this pipeline already uses.

use evalforge_llm::{LlmBackend, Message, Role, call_structured};
use evalforge_model::{
    DatasetExample, Format, Policy, TestCase, UseCase, schema::fallback_examples_response_schema,
};
use evalforge_utils::error::LlmError;
use regex::Regex;

use crate::assemble::{coerce_raw_example, extract_referenced_policy_ids};

/// `metadata.generator` value stamped on every example this fallback
/// produces.
pub const FALLBACK_GENERATOR_TAG: &str = "openai_fallback";

pub async fn direct_fallback(
    backend: &dyn LlmBackend,
    use_case: &UseCase,
    policies: &[Policy],
    format: Format,
    count: usize,
    test_case_id_for: impl Fn(usize) -> String,
    example_id_for: impl Fn(usize) -> String,
    model: &str,
    seed: Option<u64>,
) -> Result<(Vec<TestCase>, Vec<DatasetExample>), LlmError> {
    let messages = vec![
        Message::system(
            "You generate evaluation dataset examples directly, with no \
             intermediate tool selection. Respond only with JSON matching \
             the requested schema.",
        ),
        Message::new(
            Role::User,
            format!(
                "Generate exactly {count} remaining dataset example(s) in \
                 the \"{format}\" format for use case \"{}\" ({}). Each \
                 example must reference at least one of these policy ids in \
                 `policy_ids`: {}.",
                use_case.name,
                use_case.description,
                policies.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", "),
            ),
        ),
    ];
    let schema = fallback_examples_response_schema();
    let response =
        call_structured(backend, "direct_fallback", model, messages, seed, &schema).await?;

    let raw_examples = response
        .get("examples")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let policy_regex = Regex::new(r"pol_[A-Za-z0-9_]+").expect("static pol_ id pattern is valid");
    let mut test_cases = Vec::new();
    let mut examples = Vec::new();

    for (index, raw) in raw_examples.into_iter().take(count).enumerate() {
        let tc_id = test_case_id_for(index);
        let ex_id = example_id_for(index);
        let extra_policy_ids = extract_referenced_policy_ids(&raw, &policy_regex, policies);

        let default_policy_ids: Vec<String> = policies.iter().map(|p| p.id.clone()).collect();
        let test_case = TestCase {
            id: tc_id.clone(),
            case: use_case.case,
            use_case_id: use_case.id.clone(),
            name: format!("{} direct fallback", use_case.name),
            description: use_case.description.clone(),
            parameter_variation_axes: vec!["generator".to_string(), "format".to_string()],
            parameters: std::collections::BTreeMap::new(),
            policy_ids: if extra_policy_ids.is_empty() {
                default_policy_ids.clone()
            } else {
                extra_policy_ids
            },
        };

        let (input, expected_output, criteria, mut policy_ids) =
            coerce_raw_example(&raw, format);
        if policy_ids.is_empty() {
            policy_ids = default_policy_ids;
        }

        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("generator".to_string(), serde_json::json!(FALLBACK_GENERATOR_TAG));

        test_cases.push(test_case.clone());
        examples.push(DatasetExample {
            id: ex_id,
            case: use_case.case,
            format,
            use_case_id: use_case.id.clone(),
            test_case_id: test_case.id,
            input,
            expected_output,
            evaluation_criteria: criteria,
            policy_ids,
            metadata,
        });
    }

    Ok((test_cases, examples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalforge_llm::LlmInvocation;
    use evalforge_model::{Case, PolicyType};

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
            case: Case::SupportBot,
            name: "n".to_string(),
            description: "d".to_string(),
            evidence: vec![],
        }
    }

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

    #[tokio::test]
    async fn tags_every_produced_example_with_fallback_generator() {
        let backend = StubBackend {
            response: serde_json::json!({
                "examples": [{
                    "messages": [{"role": "user", "content": "hi"}],
                    "expected_output": "out",
                    "evaluation_criteria": ["a", "b", "c"],
                    "policy_ids": ["pol_001"]
                }]
            })
            .to_string(),
        };
        let (_, examples) = direct_fallback(
            &backend,
            &use_case(),
            &policies(),
            Format::SingleTurnQa,
            1,
            |i| format!("tc_fb_{i:03}"),
            |i| format!("ex_fb_{i:03}"),
            "m",
            None,
        )
        .await
        .unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(
            examples[0].metadata.get("generator").and_then(|v| v.as_str()),
            Some(FALLBACK_GENERATOR_TAG)
        );
    }
}
