//! Use-case extractor: a single structured LLM call over the
//! line-prefixed source, producing evidence-backed [`UseCase`]s.

use evalforge_llm::{LlmBackend, Message, Role, call_structured};
use evalforge_model::{Case, UseCase, ValidationIssue, make_id, schema::use_cases_response_schema};
use evalforge_utils::error::LlmError;
use tracing::info;

use crate::evidence_check::check_all;
use crate::source::ParsedSource;

/// Placeholder case assigned to every extracted entity until the case/format
/// detector writes the real classification back in place. Extraction
/// runs before detection and cannot know the case itself.
pub const UNDETECTED_CASE: Case = Case::SupportBot;

const IDENTIFICATION_RULES: &str = "\
Identify use cases using semantic patterns only, never by referring to any \
specific document:\n\
- action-modality verbs (\"the system must/should/can...\")\n\
- question-answer pairs that imply a recurring interaction\n\
- table rows whose cells encode an intent (trigger -> response)\n\
- prose describing an implicit scenario even without an explicit trigger verb\n\
\n\
For every use case, cite evidence that:\n\
- preserves all Markdown punctuation (*, **, bullets, pipes) and internal \
whitespace verbatim, with no truncation\n\
- takes line numbers from the \"<n>: \" prefixes in the supplied text\n\
- never includes the \"<n>: \" prefix itself inside the quote\n\
- joins multi-line quotes with a single newline character";

fn build_prompt(source: &ParsedSource, minimum_count: usize) -> Vec<Message> {
    let task = serde_json::json!({
        "objective": "extract use cases from a Russian-language requirements document",
        "minimum_count": minimum_count,
        "id_format": "uc_NNN",
        "content_language": "Russian",
        "evidence_accuracy": "CHARACTER-EXACT",
    });
    let content = format!(
        "{}\n\nIdentification and evidence rules:\n{}\n\nSource document \
         (line-numbered):\n{}",
        serde_json::to_string_pretty(&task).unwrap_or_default(),
        IDENTIFICATION_RULES,
        source.with_line_prefixes(),
    );
    vec![
        Message::system(
            "You extract structured use cases from requirements documents. \
             Respond only with JSON matching the requested schema.",
        ),
        Message::new(Role::User, content),
    ]
}

/// Extract use cases from `source` via one structured call. Evidence
/// mismatches are returned as warnings alongside the (unfiltered) use
/// cases — a mismatch never removes its enclosing use case.
pub async fn extract_use_cases(
    backend: &dyn LlmBackend,
    source: &ParsedSource,
    model: &str,
    seed: Option<u64>,
    minimum_count: usize,
) -> Result<(Vec<UseCase>, Vec<ValidationIssue>), LlmError> {
    let messages = build_prompt(source, minimum_count);
    let schema = use_cases_response_schema();
    let response = call_structured(
        backend,
        "use_case_extractor",
        model,
        messages,
        seed,
        &schema,
    )
    .await?;

    let raw_use_cases = response
        .get("use_cases")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut use_cases = Vec::with_capacity(raw_use_cases.len());
    let mut warnings = Vec::new();

    for (index, raw) in raw_use_cases.into_iter().enumerate() {
        let name = raw
            .get("name")
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
            .filter(|s| s.starts_with(evalforge_model::USE_CASE_PREFIX))
            .map(str::to_string)
            .unwrap_or_else(|| make_id(evalforge_model::USE_CASE_PREFIX, index + 1));

        let owner = format!("use case {id}");
        warnings.extend(check_all(&evidence, source, &owner));

        use_cases.push(UseCase {
            id,
            case: UNDETECTED_CASE,
            name,
            description,
            evidence,
        });
    }

    info!(count = use_cases.len(), "extracted use cases");
    Ok((use_cases, warnings))
}
