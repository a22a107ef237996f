//! Per-use-case orchestration: variation routing, per-format adapter
//! generation, supplementary-engine and direct-fallback shortfall recovery,
//! and per-use-case coverage enforcement.

use evalforge_config::PipelineDefaults;
use evalforge_formats::{adapter_for, route, source_classifier};
use evalforge_llm::LlmBackend;
use evalforge_model::{DatasetExample, Case, Format, Policy, TestCase, UseCase, ValidationIssue};
use tracing::{info, warn};

use crate::engines::{choose_engine, run_engine};
use crate::fallback::direct_fallback;

/// Everything one use case's generation pass produced, plus the
/// diagnostics coverage enforcement surfaced as warnings.
pub struct UseCaseOutput {
    pub test_cases: Vec<TestCase>,
    pub examples: Vec<DatasetExample>,
    pub frameworks_used: Vec<String>,
    pub warnings: Vec<ValidationIssue>,
}

/// `tc_`/`ex_` ids produced here are provisional — unique and correctly
/// ordered within this use case, but not yet the final file-wide sequential
/// numbering. The pipeline driver renumbers every id once all use cases
/// have been generated, so that per-use-case work (including
/// `tokio::task::JoinSet` concurrency) never needs a cross-task shared
/// counter.
fn provisional_id(prefix: &str, use_case_index: usize, local_index: usize) -> String {
    format!("{prefix}u{use_case_index}_{local_index:04}")
}

#[allow(clippy::too_many_arguments)]
pub async fn generate_for_use_case(
    backend: &dyn LlmBackend,
    use_case: &UseCase,
    use_case_index: usize,
    policies: &[Policy],
    formats: &[Format],
    model: &str,
    seed: Option<u64>,
    escalation_sentence: &str,
    pipeline: &PipelineDefaults,
) -> UseCaseOutput {
    let sub_seed = seed.map(|s| s.wrapping_add(use_case_index as u64));
    let combos = route(use_case.case, pipeline.min_test_cases_per_uc, sub_seed.unwrap_or(0));

    let mut test_cases = Vec::new();
    let mut examples = Vec::new();
    let mut frameworks_used: Vec<String> = Vec::new();
    let mut local_index: usize = 0;

    fn note_framework(frameworks_used: &mut Vec<String>, name: &str) {
        if !frameworks_used.iter().any(|f| f == name) {
            frameworks_used.push(name.to_string());
        }
    }

    for &format in formats {
        let adapter = adapter_for(format, use_case.case);
        for combo in &combos {
            local_index += 1;
            let test_case = TestCase {
                id: provisional_id("tc_", use_case_index, local_index),
                case: use_case.case,
                use_case_id: use_case.id.clone(),
                name: format!("{} ({format})", use_case.name),
                description: use_case.description.clone(),
                parameter_variation_axes: combo.parameter_variation_axes.clone(),
                parameters: combo.parameters.clone(),
                policy_ids: policies.iter().map(|p| p.id.clone()).collect(),
            };

            let example_id = provisional_id("ex_", use_case_index, local_index);
            let generated = adapter
                .generate_example(
                    backend,
                    use_case,
                    policies,
                    &test_case,
                    example_id,
                    model,
                    sub_seed,
                    escalation_sentence,
                )
                .await;

            let mut example = match generated {
                Ok(example) => example,
                Err(error) => {
                    warn!(use_case = %use_case.id, %error, "format adapter generation failed, skipping variation");
                    continue;
                }
            };

            if use_case.case == Case::SupportBot {
                let source =
                    source_classifier::classify(backend, use_case, &test_case, model, sub_seed).await;
                example.metadata.insert("source".to_string(), serde_json::json!(source.to_string()));
            }

            let issues = adapter.validate_format(&example);
            if !issues.is_empty() {
                warn!(
                    use_case = %use_case.id,
                    issues = issues.len(),
                    "generated example failed structural validation, discarding"
                );
                continue;
            }

            note_framework(&mut frameworks_used, "format_adapter");
            test_cases.push(test_case);
            examples.push(example);
        }
    }

    // Supplement via function-calling engines if this use case is still
    // short of its minimum, targeting the first (primary) format.
    let primary_format = formats.first().copied().unwrap_or(Format::SingleTurnQa);
    let mut shortfall = pipeline.min_test_cases_per_uc.saturating_sub(examples.len());

    if shortfall > 0 {
        let (engine, count) = choose_engine(backend, use_case, shortfall, model, sub_seed).await;
        let start = local_index + 1;
        match run_engine(
            engine,
            backend,
            use_case,
            policies,
            primary_format,
            count,
            |i| provisional_id("tc_", use_case_index, start + i),
            |i| provisional_id("ex_", use_case_index, start + i),
            model,
            sub_seed,
        )
        .await
        {
            Ok((mut engine_test_cases, mut engine_examples)) => {
                local_index += engine_examples.len();
                note_framework(&mut frameworks_used, engine.tool_name());
                test_cases.append(&mut engine_test_cases);
                examples.append(&mut engine_examples);
            }
            Err(error) => {
                warn!(use_case = %use_case.id, %error, "supplementary engine call failed");
            }
        }
        shortfall = pipeline.min_test_cases_per_uc.saturating_sub(examples.len());
    }

    // Direct fallback if engines still left a gap.
    if shortfall > 0 {
        let start = local_index + 1;
        match direct_fallback(
            backend,
            use_case,
            policies,
            primary_format,
            shortfall,
            |i| provisional_id("tc_", use_case_index, start + i),
            |i| provisional_id("ex_", use_case_index, start + i),
            model,
            sub_seed,
        )
        .await
        {
            Ok((mut fb_test_cases, mut fb_examples)) => {
                note_framework(&mut frameworks_used, crate::fallback::FALLBACK_GENERATOR_TAG);
                test_cases.append(&mut fb_test_cases);
                examples.append(&mut fb_examples);
            }
            Err(error) => {
                warn!(use_case = %use_case.id, %error, "direct fallback call failed");
            }
        }
    }

    let warnings = evalforge_validation::enforce_use_case(use_case, &test_cases, &examples, pipeline);

    info!(
        use_case = %use_case.id,
        test_cases = test_cases.len(),
        examples = examples.len(),
        "finished use case generation"
    );

    UseCaseOutput {
        test_cases,
        examples,
        frameworks_used,
        warnings,
    }
}
