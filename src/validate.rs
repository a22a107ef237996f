//! Standalone validator (`validate(out_dir)`): reload the five
//! artifacts from disk and re-run every coverage/integrity check at error
//! severity, independent of whatever process produced them.

use camino::Utf8Path;
use evalforge_utils::error::PipelineError;
use evalforge_validation::ValidationReport;

use crate::artifacts_io::load_all;

/// `validate(out_dir) -> {errors, warnings, counts}`. Disposition is
/// success iff `report.errors.is_empty()`; warnings never affect it.
pub fn validate(out_dir: &Utf8Path) -> Result<ValidationReport, PipelineError> {
    let loaded = load_all(out_dir)?;
    Ok(evalforge_validation::validate_artifacts(
        &loaded.use_cases,
        &loaded.policies,
        &loaded.test_cases,
        &loaded.examples,
        loaded.manifest.detected_case,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts_io::write_all;
    use camino::Utf8PathBuf;
    use evalforge_model::{
        Case, DatasetExample, Evidence, Format, InputData, ManifestCounts, ManifestLlmInfo,
        Message, Policy, PolicyType, Role, RunManifest, TestCase, UseCase,
    };
    use std::collections::BTreeMap;

    fn fixture_use_case() -> UseCase {
        UseCase {
            id: "uc_001".to_string(),
            case: Case::SupportBot,
            name: "Order status".to_string(),
            description: "User asks about order status".to_string(),
            evidence: vec![Evidence {
                input_file: "doc.md".to_string(),
                line_start: 1,
                line_end: 1,
                quote: "q".to_string(),
            }],
        }
    }

    fn fixture_policy() -> Policy {
        Policy {
            id: "pol_001".to_string(),
            case: Case::SupportBot,
            policy_type: PolicyType::Must,
            statement: "s".to_string(),
            description: "d".to_string(),
            evidence: vec![],
        }
    }

    fn fixture_test_case() -> TestCase {
        TestCase {
            id: "tc_001".to_string(),
            case: Case::SupportBot,
            use_case_id: "uc_001".to_string(),
            name: "n".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["tone".into(), "language".into()],
            parameters: BTreeMap::new(),
            policy_ids: vec!["pol_001".to_string()],
        }
    }

    fn fixture_example(id: &str, source: &str) -> DatasetExample {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), serde_json::json!(source));
        DatasetExample {
            id: id.to_string(),
            case: Case::SupportBot,
            format: Format::SingleTurnQa,
            use_case_id: "uc_001".to_string(),
            test_case_id: "tc_001".to_string(),
            input: InputData {
                messages: vec![Message::new(Role::User, "hi")],
                target_message_index: None,
            },
            expected_output: "out".to_string(),
            evaluation_criteria: vec!["a".into(), "b".into(), "c".into()],
            policy_ids: vec!["pol_001".to_string()],
            metadata,
        }
    }

    fn fixture_manifest(counts: ManifestCounts) -> RunManifest {
        RunManifest {
            input_path: "doc.md".to_string(),
            out_path: "out".to_string(),
            seed: Some(1),
            timestamp: "2026-07-29T00:00:00Z".to_string(),
            generator_version: "1.0.0".to_string(),
            llm: ManifestLlmInfo {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4-5".to_string(),
                temperature: 0.0,
            },
            frameworks_used: vec!["format_adapter".to_string()],
            counts,
            detected_case: Case::SupportBot,
            detected_formats: vec![Format::SingleTurnQa],
        }
    }

    #[test]
    fn coherent_artifact_set_passes_validation() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let examples = vec![
            fixture_example("ex_001", "tickets"),
            fixture_example("ex_002", "faq_paraphrase"),
            fixture_example("ex_003", "corner"),
        ];
        let manifest = fixture_manifest(ManifestCounts {
            use_cases: 1,
            policies: 1,
            test_cases: 1,
            dataset_examples: 3,
        });
        write_all(
            &out_dir,
            &[fixture_use_case()],
            &[fixture_policy()],
            &[fixture_test_case()],
            &examples,
            &manifest,
        )
        .unwrap();

        let report = validate(&out_dir).unwrap();
        assert!(report.is_success(), "{:?}", report.errors);
    }

    #[test]
    fn dangling_policy_id_is_an_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let mut example = fixture_example("ex_001", "tickets");
        example.policy_ids = vec!["pol_999".to_string()];
        let manifest = fixture_manifest(ManifestCounts {
            use_cases: 1,
            policies: 1,
            test_cases: 1,
            dataset_examples: 1,
        });
        write_all(
            &out_dir,
            &[fixture_use_case()],
            &[fixture_policy()],
            &[fixture_test_case()],
            &[example],
            &manifest,
        )
        .unwrap();

        let report = validate(&out_dir).unwrap();
        assert!(!report.is_success());
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.code == "integrity.unresolved_policy")
        );
    }
}
