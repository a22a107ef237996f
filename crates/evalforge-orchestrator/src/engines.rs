//! Function-calling supplementary engines: three named
//! external synthesisers the orchestrator may call through to close a
//! shortfall, each reached via its own structured-call persona and mapped
//! back into `DatasetExample`s by a dedicated, LLM-free adapter function.

use evalforge_llm::{LlmBackend, Message, Role, call_structured};
use evalforge_model::{
    DatasetExample, Format, Policy, TestCase, UseCase, schema::fallback_examples_response_schema,
};
use evalforge_utils::error::LlmError;
use regex::Regex;
use tracing::warn;

use crate::assemble::{coerce_raw_example, extract_referenced_policy_ids};

/// The three named supplementary engines. Each wraps a distinct generation
/// strategy; which one gets invoked is chosen by the model itself via a
/// tool-selection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    DocumentBulkSynthesizer,
    RagMultiContextGenerator,
    KnowledgeBaseRaget,
}

impl EngineKind {
    #[must_use]
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::DocumentBulkSynthesizer => "document_bulk_synthesizer",
            Self::RagMultiContextGenerator => "rag_multi_context_generator",
            Self::KnowledgeBaseRaget => "knowledge_base_raget",
        }
    }

    #[must_use]
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "document_bulk_synthesizer" => Some(Self::DocumentBulkSynthesizer),
            "rag_multi_context_generator" => Some(Self::RagMultiContextGenerator),
            "knowledge_base_raget" => Some(Self::KnowledgeBaseRaget),
            _ => None,
        }
    }

    fn persona(self) -> &'static str {
        match self {
            Self::DocumentBulkSynthesizer => {
                "You are a bulk synthesiser that mass-produces dataset examples \
                 directly from the source document's text, favoring volume and \
                 document fidelity over variety."
            }
            Self::RagMultiContextGenerator => {
                "You are a retrieval-augmented generator that composes each \
                 example from several distinct contextual snippets stitched \
                 together, favoring breadth of scenario over a single source \
                 passage."
            }
            Self::KnowledgeBaseRaget => {
                "You are a knowledge-base RAG evaluation-dataset generator \
                 (RAGET-style) that grounds every example in a specific \
                 knowledge-base fact, favoring factual traceability."
            }
        }
    }

    fn tool_schema(self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["tool"],
            "properties": {
                "tool": { "type": "string", "const": self.tool_name() },
                "arguments": {
                    "type": "object",
                    "properties": {
                        "count": { "type": "integer", "minimum": 1 },
                        "topic_hint": { "type": "string" }
                    }
                }
            }
        })
    }
}

/// Tool-choice schema offered to the model: pick exactly one of the three
/// engines (`tool_choice = auto` modeled as a single structured call the
/// model must answer with one of the three tool names).
fn tool_choice_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["tool"],
        "properties": {
            "tool": {
                "type": "string",
                "enum": [
                    EngineKind::DocumentBulkSynthesizer.tool_name(),
                    EngineKind::RagMultiContextGenerator.tool_name(),
                    EngineKind::KnowledgeBaseRaget.tool_name(),
                ]
            },
            "arguments": {
                "type": "object",
                "properties": {
                    "count": { "type": "integer", "minimum": 1 },
                    "topic_hint": { "type": "string" }
                }
            }
        }
    })
}

/// Ask the model which supplementary engine to invoke for `shortfall`
/// additional examples, with tool arguments JSON-validated before
/// invocation. Falls back to the document bulk synthesiser — the least
/// context-dependent engine — on any failure.
pub async fn choose_engine(
    backend: &dyn LlmBackend,
    use_case: &UseCase,
    shortfall: usize,
    model: &str,
    seed: Option<u64>,
) -> (EngineKind, usize) {
    let messages = vec![
        Message::system(
            "You select which supplementary dataset-generation tool to \
             invoke next. Respond only with JSON matching the requested \
             schema.",
        ),
        Message::new(
            Role::User,
            format!(
                "Use case \"{}\" is short {shortfall} example(s) of its \
                 minimum coverage target. Choose exactly one tool to \
                 generate the remainder: document_bulk_synthesizer (mass \
                 synthesis from document text), rag_multi_context_generator \
                 (multi-snippet composition), or knowledge_base_raget \
                 (single-fact-grounded). Pass `count` = {shortfall} in \
                 arguments.",
                use_case.name
            ),
        ),
    ];

    let schema = tool_choice_schema();
    match call_structured(backend, "engine_selector", model, messages, seed, &schema).await {
        Ok(response) => {
            let tool = response
                .get("tool")
                .and_then(|v| v.as_str())
                .and_then(EngineKind::from_tool_name)
                .unwrap_or(EngineKind::DocumentBulkSynthesizer);
            let count = response
                .get("arguments")
                .and_then(|a| a.get("count"))
                .and_then(serde_json::Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(shortfall);
            (tool, count.max(1))
        }
        Err(error) => {
            warn!(%error, "engine selection call failed, defaulting to document_bulk_synthesizer");
            (EngineKind::DocumentBulkSynthesizer, shortfall)
        }
    }
}

fn policy_id_regex() -> Regex {
    Regex::new(r"pol_[A-Za-z0-9_]+").expect("static pol_ id pattern is valid")
}

/// Invoke `engine` for `count` examples in `format`, then run its raw output
/// through the hard-coded (LLM-free) mapping into [`TestCase`]/
/// [`DatasetExample`] pairs, tagging `metadata.generator` with the engine's
/// name and recovering any `pol_*` ids mentioned in free-text context.
pub async fn run_engine(
    engine: EngineKind,
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
        Message::system(engine.persona()),
        Message::new(
            Role::User,
            format!(
                "Generate {count} dataset example(s) in the \"{format}\" \
                 format for use case \"{}\" ({}). Context: {}.\n\nEach \
                 example must reference at least one of these policy ids in \
                 `policy_ids`: {}.",
                use_case.name,
                use_case.description,
                use_case.description,
                policies.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", "),
            ),
        ),
    ];
    let schema = fallback_examples_response_schema();
    let response =
        call_structured(backend, engine.tool_name(), model, messages, seed, &schema).await?;

    let raw_examples = response
        .get("examples")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let policy_regex = policy_id_regex();
    let mut test_cases = Vec::new();
    let mut examples = Vec::new();

    for (index, raw) in raw_examples.into_iter().take(count).enumerate() {
        let tc_id = test_case_id_for(index);
        let ex_id = example_id_for(index);
        let extra_policy_ids = extract_referenced_policy_ids(&raw, &policy_regex, policies);

        let test_case = TestCase {
            id: tc_id.clone(),
            case: use_case.case,
            use_case_id: use_case.id.clone(),
            name: format!("{} supplementary ({})", use_case.name, engine.tool_name()),
            description: use_case.description.clone(),
            parameter_variation_axes: vec!["generator".to_string(), "format".to_string()],
            parameters: std::collections::BTreeMap::new(),
            policy_ids: if extra_policy_ids.is_empty() {
                policies.iter().map(|p| p.id.clone()).collect()
            } else {
                extra_policy_ids.clone()
            },
        };

        let (input, expected_output, criteria, mut policy_ids) =
            coerce_raw_example(&raw, format);
        if policy_ids.is_empty() {
            policy_ids = test_case.policy_ids.clone();
        }

        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("generator".to_string(), serde_json::json!(engine.tool_name()));

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
