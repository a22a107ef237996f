//! Pipeline driver: runs every stage strictly in order, renumbers ids to
//! their final file-wide sequence, and writes all five artifacts plus the
//! manifest atomically. A fatal failure at any stage aborts the run and
//! persists nothing.
//!
//! Use cases are embarrassingly parallelisable, so they are generated
//! concurrently across `tokio::task::JoinSet`: each task gets a seed
//! derived from its use-case index (`evalforge_orchestrator::generate::
//! provisional_id`'s sibling, `sub_seed`), and results are re-sorted into
//! use-case order before assembly so the final artifact ordering never
//! depends on task completion order.

use std::sync::Arc;

use camino::Utf8Path;
use evalforge_config::Config;
use evalforge_detect::CaseFormatDetection;
use evalforge_llm::BackendPair;
use evalforge_model::{
    DatasetExample, ManifestCounts, ManifestLlmInfo, Policy, RunManifest, TestCase, UseCase,
    ValidationIssue,
};
use evalforge_utils::error::PipelineError;
use tracing::{info, warn};

use crate::artifacts_io;
use crate::renumber::renumber;

/// Minimum policies expected per run — not an operator-tunable knob like
/// the three counts in [`evalforge_config::PipelineDefaults`], since this
/// is a fixed floor rather than a per-run setting.
const MIN_POLICIES: usize = 5;

/// Everything one `generate(...)` run produced, before the caller decides
/// what to do with it (the thin CLI prints a summary; library embedders
/// inspect the fields directly).
pub struct GenerateOutcome {
    pub use_cases: Vec<UseCase>,
    pub policies: Vec<Policy>,
    pub test_cases: Vec<TestCase>,
    pub examples: Vec<DatasetExample>,
    pub manifest: RunManifest,
    pub detection: CaseFormatDetection,
    /// Every non-fatal issue collected during generation: evidence
    /// mismatch, coverage/integrity gaps — warnings here, errors only
    /// under [`crate::validate::validate`].
    pub warnings: Vec<ValidationIssue>,
}

/// Run the full pipeline: read source, extract, detect, generate,
/// enforce coverage, and persist.
pub async fn generate(config: &Config) -> Result<GenerateOutcome, PipelineError> {
    let source = evalforge_extraction::ParsedSource::read(&config.input_path)?;
    info!(lines = source.line_count(), "read source document");

    let backend_pair = BackendPair::from_config(&config.llm)?;
    let backend = backend_pair.backend();
    let model = config.llm.primary.model.clone();

    let (mut use_cases, mut warnings) = evalforge_extraction::extract_use_cases(
        backend.as_ref(),
        &source,
        &model,
        config.seed,
        config.pipeline.min_use_cases,
    )
    .await?;
    info!(count = use_cases.len(), "extracted use cases");

    let (mut policies, policy_warnings) = evalforge_extraction::extract_policies(
        backend.as_ref(),
        &source,
        &model,
        config.seed,
        MIN_POLICIES,
    )
    .await?;
    warnings.extend(policy_warnings);
    info!(count = policies.len(), "extracted policies");

    let detection =
        evalforge_detect::detect(backend.as_ref(), &use_cases, &policies, &model, config.seed)
            .await;
    info!(case = %detection.case, formats = ?detection.formats, "detected case/formats");

    // The detected case is written into every UseCase and Policy in place;
    // this is the only post-extraction mutation of extracted entities.
    for uc in &mut use_cases {
        uc.case = detection.case;
    }
    for policy in &mut policies {
        policy.case = detection.case;
    }

    let (test_cases, examples, generation_warnings, frameworks_used) =
        generate_all_use_cases(&backend, &use_cases, &policies, &detection, &model, config).await?;
    warnings.extend(generation_warnings);

    warnings.extend(evalforge_validation::check_format_coverage(
        detection.case,
        &examples,
    ));
    warnings.extend(evalforge_validation::check_source_coverage(
        detection.case,
        &examples,
    ));
    warnings.extend(evalforge_validation::check_referential_integrity(
        &use_cases,
        &policies,
        &test_cases,
        &examples,
    ));
    for issue in &warnings {
        warn!(code = %issue.code, message = %issue.message, "generation warning");
    }

    let manifest = RunManifest {
        input_path: config.input_path.display().to_string(),
        out_path: config.out_path.display().to_string(),
        seed: config.seed,
        timestamp: chrono::Utc::now().to_rfc3339(),
        generator_version: config.generator_version.clone(),
        llm: ManifestLlmInfo {
            provider: config.llm.primary.provider.to_string(),
            model: model.clone(),
            temperature: config.llm.temperature,
        },
        frameworks_used,
        counts: ManifestCounts {
            use_cases: use_cases.len(),
            policies: policies.len(),
            test_cases: test_cases.len(),
            dataset_examples: examples.len(),
        },
        detected_case: detection.case,
        detected_formats: detection.formats.clone(),
    };

    let out_dir = Utf8Path::from_path(&config.out_path).ok_or_else(|| PipelineError::WriteIo {
        path: config.out_path.display().to_string(),
        reason: "output path is not valid UTF-8".to_string(),
    })?;
    artifacts_io::write_all(out_dir, &use_cases, &policies, &test_cases, &examples, &manifest)?;
    info!(out_dir = %out_dir, "wrote artifacts and manifest");

    Ok(GenerateOutcome {
        use_cases,
        policies,
        test_cases,
        examples,
        manifest,
        detection,
        warnings,
    })
}

#[allow(clippy::type_complexity)]
async fn generate_all_use_cases(
    backend: &Arc<dyn evalforge_llm::LlmBackend>,
    use_cases: &[UseCase],
    policies: &[Policy],
    detection: &CaseFormatDetection,
    model: &str,
    config: &Config,
) -> Result<
    (
        Vec<TestCase>,
        Vec<DatasetExample>,
        Vec<ValidationIssue>,
        Vec<String>,
    ),
    PipelineError,
> {
    let policies_arc = Arc::new(policies.to_vec());
    let formats_arc = Arc::new(detection.formats.clone());
    let escalation_sentence = Arc::new(config.escalation_sentence.clone());

    let mut join_set = tokio::task::JoinSet::new();
    for (index, use_case) in use_cases.iter().cloned().enumerate() {
        let backend = Arc::clone(backend);
        let policies = Arc::clone(&policies_arc);
        let formats = Arc::clone(&formats_arc);
        let escalation_sentence = Arc::clone(&escalation_sentence);
        let model = model.to_string();
        let seed = config.seed;
        let pipeline = config.pipeline;
        join_set.spawn(async move {
            let output = evalforge_orchestrator::generate_for_use_case(
                backend.as_ref(),
                &use_case,
                index,
                &policies,
                &formats,
                &model,
                seed,
                &escalation_sentence,
                &pipeline,
            )
            .await;
            (index, output)
        });
    }

    let mut indexed = Vec::with_capacity(use_cases.len());
    while let Some(joined) = join_set.join_next().await {
        let (index, output) = joined.map_err(|e| PipelineError::StageFailed {
            stage: "orchestrator".to_string(),
            reason: e.to_string(),
        })?;
        indexed.push((index, output));
    }
    // Re-impose use-case order regardless of which task finished first.
    indexed.sort_by_key(|(index, _)| *index);

    let mut test_cases = Vec::new();
    let mut examples = Vec::new();
    let mut warnings = Vec::new();
    let mut frameworks_used: Vec<String> = Vec::new();
    for (_, output) in indexed {
        test_cases.extend(output.test_cases);
        examples.extend(output.examples);
        warnings.extend(output.warnings);
        for framework in output.frameworks_used {
            if !frameworks_used.contains(&framework) {
                frameworks_used.push(framework);
            }
        }
    }

    let (test_cases, examples) = renumber(test_cases, examples);
    Ok((test_cases, examples, warnings, frameworks_used))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_policies_matches_spec_floor() {
        assert_eq!(MIN_POLICIES, 5);
    }
}
