//! Coverage and referential-integrity enforcement. Every check here
//! is run at two different severities by its two call sites: the
//! orchestrator treats a returned issue as a warning during generation,
//! while the standalone validator (`evalforge-validation::validate_artifacts`)
//! treats the same issue as an error.

use std::collections::HashSet;

use evalforge_config::PipelineDefaults;
use evalforge_model::{
    Case, DatasetExample, Format, ManifestCounts, Policy, Source, TestCase, UseCase,
    ValidationIssue,
};

/// Per-use-case checks: minimum test case count, 2-3 non-empty axis names
/// per test case, and each of that use case's examples
/// carrying >=3 evaluation criteria and >=1 policy id. The structural parts
/// of the last two are already enforced by `DatasetExample::validate`;
/// this call re-derives the same issues scoped to one use case so an
/// orchestrator can report per-use-case shortfalls without re-running
/// validation on the whole pipeline.
#[must_use]
pub fn enforce_use_case(
    use_case: &UseCase,
    test_cases: &[TestCase],
    examples: &[DatasetExample],
    pipeline: &PipelineDefaults,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let own_test_cases: Vec<&TestCase> =
        test_cases.iter().filter(|tc| tc.use_case_id == use_case.id).collect();
    if own_test_cases.len() < pipeline.min_test_cases_per_uc {
        issues.push(ValidationIssue::new(
            "coverage.min_test_cases",
            format!(
                "use case {} has {} test cases, expected at least {}",
                use_case.id,
                own_test_cases.len(),
                pipeline.min_test_cases_per_uc
            ),
        ));
    }
    for tc in &own_test_cases {
        issues.extend(tc.validate());
    }

    let own_examples: Vec<&DatasetExample> =
        examples.iter().filter(|ex| ex.use_case_id == use_case.id).collect();
    for example in &own_examples {
        issues.extend(example.validate());
    }

    issues
}

/// Format coverage: `operator_quality` must surface
/// both correction formats somewhere in `dataset.json`; `support_bot` must
/// surface `single_turn_qa`. `doctor_booking` carries no additional format
/// coverage requirement of its own.
#[must_use]
pub fn check_format_coverage(case: Case, examples: &[DatasetExample]) -> Vec<ValidationIssue> {
    let present: HashSet<Format> = examples.iter().map(|ex| ex.format).collect();
    let mut issues = Vec::new();
    match case {
        Case::OperatorQuality => {
            for required in [Format::SingleUtteranceCorrection, Format::DialogLastTurnCorrection] {
                if !present.contains(&required) {
                    issues.push(ValidationIssue::new(
                        "coverage.missing_format",
                        format!("operator_quality run is missing required format {required}"),
                    ));
                }
            }
        }
        Case::SupportBot => {
            if !present.contains(&Format::SingleTurnQa) {
                issues.push(ValidationIssue::new(
                    "coverage.missing_format",
                    "support_bot run is missing required format single_turn_qa".to_string(),
                ));
            }
        }
        Case::DoctorBooking => {}
    }
    issues
}

/// Source coverage (`support_bot` only): all three
/// `metadata.source` values must appear across `dataset.json`.
#[must_use]
pub fn check_source_coverage(case: Case, examples: &[DatasetExample]) -> Vec<ValidationIssue> {
    if case != Case::SupportBot {
        return Vec::new();
    }
    let present: HashSet<String> = examples
        .iter()
        .filter_map(|ex| ex.metadata.get("source").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();
    Source::all()
        .into_iter()
        .filter(|source| !present.contains(&source.to_string()))
        .map(|source| {
            ValidationIssue::new(
                "coverage.missing_source",
                format!("support_bot run never produced a '{source}' example"),
            )
        })
        .collect()
}

/// Referential integrity: every cross-file id reference must resolve.
/// Stronger than the prefix-only checks each entity's own `validate()`
/// performs.
#[must_use]
pub fn check_referential_integrity(
    use_cases: &[UseCase],
    policies: &[Policy],
    test_cases: &[TestCase],
    examples: &[DatasetExample],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let use_case_ids: HashSet<&str> = use_cases.iter().map(|uc| uc.id.as_str()).collect();
    let policy_ids: HashSet<&str> = policies.iter().map(|p| p.id.as_str()).collect();
    let test_case_ids: HashSet<&str> = test_cases.iter().map(|tc| tc.id.as_str()).collect();

    for tc in test_cases {
        if !use_case_ids.contains(tc.use_case_id.as_str()) {
            issues.push(ValidationIssue::new(
                "integrity.unresolved_use_case",
                format!("test case {} references unknown use case {}", tc.id, tc.use_case_id),
            ));
        }
        for pid in &tc.policy_ids {
            if !policy_ids.contains(pid.as_str()) {
                issues.push(ValidationIssue::new(
                    "integrity.unresolved_policy",
                    format!("test case {} references unknown policy {pid}", tc.id),
                ));
            }
        }
    }

    for example in examples {
        if !use_case_ids.contains(example.use_case_id.as_str()) {
            issues.push(ValidationIssue::new(
                "integrity.unresolved_use_case",
                format!("example {} references unknown use case {}", example.id, example.use_case_id),
            ));
        }
        if !test_case_ids.contains(example.test_case_id.as_str()) {
            issues.push(ValidationIssue::new(
                "integrity.unresolved_test_case",
                format!("example {} references unknown test case {}", example.id, example.test_case_id),
            ));
        }
        for pid in &example.policy_ids {
            if !policy_ids.contains(pid.as_str()) {
                issues.push(ValidationIssue::new(
                    "integrity.unresolved_policy",
                    format!("example {} references unknown policy {pid}", example.id),
                ));
            }
        }
    }

    issues
}

/// Full report produced by the standalone validator: every coverage or
/// integrity issue is reported as an error here, never a warning. Evidence
/// mismatches remain warnings regardless of call site — never fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub counts: ManifestCounts,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every check above at error severity, plus evidence re-validation at
/// warning severity, over a fully loaded set of artifacts.
#[must_use]
pub fn validate_artifacts(
    use_cases: &[UseCase],
    policies: &[Policy],
    test_cases: &[TestCase],
    examples: &[DatasetExample],
    detected_case: Case,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Evidence quotes were already checked against the source document at
    // extraction time (those warnings are not re-derivable here, since the
    // standalone validator only loads the five JSON artifacts, never the
    // original source); only structural evidence issues (empty quote,
    // inverted range) remain visible on a reloaded `UseCase`/`Policy` and
    // are kept as warnings, never errors — evidence mismatches are never
    // fatal.
    for uc in use_cases {
        warnings.extend(uc.validate().into_iter().filter(|i| i.code.starts_with("evidence.")));
    }
    for p in policies {
        warnings.extend(p.validate().into_iter().filter(|i| i.code.starts_with("evidence.")));
    }

    for tc in test_cases {
        errors.extend(tc.validate());
    }
    for ex in examples {
        errors.extend(ex.validate());
    }

    errors.extend(check_format_coverage(detected_case, examples));
    errors.extend(check_source_coverage(detected_case, examples));
    errors.extend(check_referential_integrity(use_cases, policies, test_cases, examples));

    ValidationReport {
        counts: ManifestCounts {
            use_cases: use_cases.len(),
            policies: policies.len(),
            test_cases: test_cases.len(),
            dataset_examples: examples.len(),
        },
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalforge_model::{Evidence, InputData, Message, Role};
    use std::collections::BTreeMap;

    fn use_case() -> UseCase {
        UseCase {
            id: "uc_001".to_string(),
            case: Case::SupportBot,
            name: "n".to_string(),
            description: "d".to_string(),
            evidence: vec![Evidence {
                input_file: "doc.md".to_string(),
                line_start: 1,
                line_end: 1,
                quote: "q".to_string(),
            }],
        }
    }

    fn example(format: Format, use_case_id: &str, test_case_id: &str) -> DatasetExample {
        let messages = match format {
            Format::SingleTurnQa => vec![Message::new(Role::User, "hi")],
            Format::SingleUtteranceCorrection => vec![Message::new(Role::Operator, "hi")],
            Format::DialogLastTurnCorrection => vec![
                Message::new(Role::User, "hi"),
                Message::new(Role::Operator, "hi"),
            ],
        };
        let target_message_index = match format {
            Format::SingleTurnQa => None,
            Format::SingleUtteranceCorrection => Some(0),
            Format::DialogLastTurnCorrection => Some(messages.len() - 1),
        };
        DatasetExample {
            id: "ex_001".to_string(),
            case: Case::SupportBot,
            format,
            use_case_id: use_case_id.to_string(),
            test_case_id: test_case_id.to_string(),
            input: InputData { messages, target_message_index },
            expected_output: "out".to_string(),
            evaluation_criteria: vec!["a".into(), "b".into(), "c".into()],
            policy_ids: vec!["pol_001".to_string()],
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn min_test_cases_shortfall_is_reported() {
        let uc = use_case();
        let pipeline = PipelineDefaults {
            min_use_cases: 1,
            min_test_cases_per_uc: 3,
            min_examples_per_tc: 1,
        };
        let issues = enforce_use_case(&uc, &[], &[], &pipeline);
        assert!(issues.iter().any(|i| i.code == "coverage.min_test_cases"));
    }

    #[test]
    fn operator_quality_requires_both_correction_formats() {
        let examples = vec![example(Format::SingleUtteranceCorrection, "uc_001", "tc_001")];
        let issues = check_format_coverage(Case::OperatorQuality, &examples);
        assert!(issues.iter().any(|i| i.message.contains("dialog_last_turn_correction")));
    }

    #[test]
    fn support_bot_source_coverage_flags_missing_values() {
        let mut ex = example(Format::SingleTurnQa, "uc_001", "tc_001");
        ex.metadata.insert("source".to_string(), serde_json::json!("tickets"));
        let issues = check_source_coverage(Case::SupportBot, &[ex]);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn referential_integrity_flags_dangling_policy_id() {
        let test_cases = vec![TestCase {
            id: "tc_001".to_string(),
            case: Case::SupportBot,
            use_case_id: "uc_001".to_string(),
            name: "n".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["a".into(), "b".into()],
            parameters: BTreeMap::new(),
            policy_ids: vec!["pol_999".to_string()],
        }];
        let issues = check_referential_integrity(&[use_case()], &[], &test_cases, &[]);
        assert!(issues.iter().any(|i| i.code == "integrity.unresolved_policy"));
    }

    #[test]
    fn validate_artifacts_succeeds_on_coherent_fixture() {
        let uc = use_case();
        let policy = Policy {
            id: "pol_001".to_string(),
            case: Case::SupportBot,
            policy_type: evalforge_model::PolicyType::Must,
            statement: "s".to_string(),
            description: "d".to_string(),
            evidence: uc.evidence.clone(),
        };
        let tc = TestCase {
            id: "tc_001".to_string(),
            case: Case::SupportBot,
            use_case_id: uc.id.clone(),
            name: "n".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["a".into(), "b".into()],
            parameters: BTreeMap::new(),
            policy_ids: vec![policy.id.clone()],
        };
        let mut ex = example(Format::SingleTurnQa, &uc.id, &tc.id);
        ex.metadata.insert("source".to_string(), serde_json::json!("tickets"));
        let mut ex2 = ex.clone();
        ex2.id = "ex_002".to_string();
        ex2.metadata.insert("source".to_string(), serde_json::json!("faq_paraphrase"));
        let mut ex3 = ex.clone();
        ex3.id = "ex_003".to_string();
        ex3.metadata.insert("source".to_string(), serde_json::json!("corner"));

        let report = validate_artifacts(&[uc], &[policy], &[tc], &[ex, ex2, ex3], Case::SupportBot);
        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(report.counts.dataset_examples, 3);
    }
}
