//! Entity structs: [`UseCase`], [`Policy`], [`TestCase`], [`Message`],
//! [`InputData`], [`DatasetExample`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{Case, Format, PolicyType, Role};
use crate::evidence::Evidence;
use crate::ids::{EXAMPLE_PREFIX, POLICY_PREFIX, TEST_CASE_PREFIX, USE_CASE_PREFIX, has_prefix};
use crate::issue::ValidationIssue;

/// Extracted use case. Created by the use-case extractor; immutable
/// thereafter except for the single `case` write-back performed by the
/// case/format detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UseCase {
    pub id: String,
    pub case: Case,
    pub name: String,
    pub description: String,
    pub evidence: Vec<Evidence>,
}

impl UseCase {
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !has_prefix(&self.id, USE_CASE_PREFIX) {
            issues.push(ValidationIssue::new(
                "use_case.id_prefix",
                format!("use case id '{}' must start with '{USE_CASE_PREFIX}'", self.id),
            ));
        }
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "use_case.empty_name",
                format!("use case {} has an empty name", self.id),
            ));
        }
        if self.evidence.is_empty() {
            issues.push(ValidationIssue::new(
                "use_case.no_evidence",
                format!("use case {} has no evidence", self.id),
            ));
        }
        for e in &self.evidence {
            issues.extend(e.validate());
        }
        issues
    }
}

/// Extracted policy. Created by the policy extractor; immutable
/// thereafter except for the `case` write-back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub id: String,
    pub case: Case,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub statement: String,
    pub description: String,
    pub evidence: Vec<Evidence>,
}

impl Policy {
    /// Populate `statement` from `description` when the extractor left it
    /// blank.
    pub fn backfill_statement(&mut self) {
        if self.statement.trim().is_empty() {
            self.statement.clone_from(&self.description);
        }
    }

    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !has_prefix(&self.id, POLICY_PREFIX) {
            issues.push(ValidationIssue::new(
                "policy.id_prefix",
                format!("policy id '{}' must start with '{POLICY_PREFIX}'", self.id),
            ));
        }
        if self.statement.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "policy.empty_statement",
                format!("policy {} has an empty statement", self.id),
            ));
        }
        if self.evidence.is_empty() {
            issues.push(ValidationIssue::new(
                "policy.no_evidence",
                format!("policy {} has no evidence", self.id),
            ));
        }
        for e in &self.evidence {
            issues.extend(e.validate());
        }
        issues
    }
}

/// A single parameter value on a variation axis. Axis domains are a mix of
/// enumerated strings and booleans; both are represented as JSON values so
/// the same `parameters` map can hold either without a tagged union per
/// axis.
pub type AxisValue = serde_json::Value;

/// Generated test case. Created by the orchestrator from the variation
/// router's output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: String,
    pub case: Case,
    pub use_case_id: String,
    pub name: String,
    pub description: String,
    pub parameter_variation_axes: Vec<String>,
    pub parameters: BTreeMap<String, AxisValue>,
    pub policy_ids: Vec<String>,
}

impl TestCase {
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !has_prefix(&self.id, TEST_CASE_PREFIX) {
            issues.push(ValidationIssue::new(
                "test_case.id_prefix",
                format!("test case id '{}' must start with '{TEST_CASE_PREFIX}'", self.id),
            ));
        }
        if !(2..=3).contains(&self.parameter_variation_axes.len()) {
            issues.push(ValidationIssue::new(
                "test_case.axis_count",
                format!(
                    "test case {} has {} variation axes, expected 2-3",
                    self.id,
                    self.parameter_variation_axes.len()),
            ));
        }
        if self.parameter_variation_axes.iter().any(|a| a.trim().is_empty()) {
            issues.push(ValidationIssue::new(
                "test_case.empty_axis_name",
                format!("test case {} has an empty axis name", self.id),
            ));
        }
        for pid in &self.policy_ids {
            if !has_prefix(pid, POLICY_PREFIX) {
                issues.push(ValidationIssue::new(
                    "test_case.policy_id_prefix",
                    format!("test case {} references malformed policy id '{pid}'", self.id),
                ));
            }
        }
        issues
    }
}

/// A single conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.content.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "message.empty_content",
                "message content must be non-empty",
            ));
        }
        issues
    }
}

/// Conversation input for a [`DatasetExample`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputData {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_message_index: Option<usize>,
}

impl InputData {
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.messages.is_empty() {
            issues.push(ValidationIssue::new(
                "input_data.no_messages",
                "input data must have at least one message",
            ));
        }
        for m in &self.messages {
            issues.extend(m.validate());
        }
        if let Some(idx) = self.target_message_index
            && (idx >= self.messages.len() || self.messages[idx].role != Role::Operator)
        {
            issues.push(ValidationIssue::new(
                "input_data.bad_target_index",
                format!(
                    "target_message_index {idx} must point at an operator message within range"
                ),
            ));
        }
        issues
    }
}

/// Generated dataset example. Created by a format adapter, or by a
/// supplementary engine / direct fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetExample {
    pub id: String,
    pub case: Case,
    pub format: Format,
    pub use_case_id: String,
    pub test_case_id: String,
    pub input: InputData,
    pub expected_output: String,
    pub evaluation_criteria: Vec<String>,
    pub policy_ids: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DatasetExample {
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !has_prefix(&self.id, EXAMPLE_PREFIX) {
            issues.push(ValidationIssue::new(
                "example.id_prefix",
                format!("example id '{}' must start with '{EXAMPLE_PREFIX}'", self.id),
            ));
        }
        if self.expected_output.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "example.empty_expected_output",
                format!("example {} has an empty expected_output", self.id),
            ));
        }
        if self.evaluation_criteria.len() < 3 {
            issues.push(ValidationIssue::new(
                "example.too_few_criteria",
                format!(
                    "example {} has {} evaluation criteria, expected >= 3",
                    self.id,
                    self.evaluation_criteria.len()),
            ));
        }
        if self.policy_ids.is_empty() {
            issues.push(ValidationIssue::new(
                "example.no_policy_ids",
                format!("example {} has no policy_ids", self.id),
            ));
        }
        for pid in &self.policy_ids {
            if !has_prefix(pid, POLICY_PREFIX) {
                issues.push(ValidationIssue::new(
                    "example.policy_id_prefix",
                    format!("example {} references malformed policy id '{pid}'", self.id),
                ));
            }
        }
        issues.extend(self.input.validate());
        issues.extend(self.validate_format_invariants());
        issues
    }

    /// Format-specific structural invariants, re-checked wherever a
    /// `DatasetExample` is validated (both at generation time by the
    /// adapter and at standalone-validate time).
    #[must_use]
    pub fn validate_format_invariants(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let msgs = &self.input.messages;
        match self.format {
            Format::SingleTurnQa => {
                if msgs.len() != 1 || msgs.first().is_some_and(|m| m.role != Role::User) {
                    issues.push(ValidationIssue::new(
                        "example.format_single_turn_qa",
                        format!("example {} must have exactly one user message", self.id),
                    ));
                }
                if self.input.target_message_index.is_some() {
                    issues.push(ValidationIssue::new(
                        "example.format_single_turn_qa_index",
                        format!("example {} must not set target_message_index", self.id),
                    ));
                }
            }
            Format::SingleUtteranceCorrection => {
                if msgs.len() != 1 || msgs.first().is_some_and(|m| m.role != Role::Operator) {
                    issues.push(ValidationIssue::new(
                        "example.format_single_utterance",
                        format!("example {} must have exactly one operator message", self.id),
                    ));
                }
                if self.input.target_message_index != Some(0) {
                    issues.push(ValidationIssue::new(
                        "example.format_single_utterance_index",
                        format!("example {} must set target_message_index = 0", self.id),
                    ));
                }
            }
            Format::DialogLastTurnCorrection => {
                if msgs.len() < 2 {
                    issues.push(ValidationIssue::new(
                        "example.format_dialog_length",
                        format!("example {} must have >= 2 messages", self.id),
                    ));
                }
                let last_is_operator = msgs.last().is_some_and(|m| m.role == Role::Operator);
                if !last_is_operator {
                    issues.push(ValidationIssue::new(
                        "example.format_dialog_last_role",
                        format!("example {}'s last message must be from operator", self.id),
                    ));
                }
                let expected_index = msgs.len().saturating_sub(1);
                if self.input.target_message_index != Some(expected_index) {
                    issues.push(ValidationIssue::new(
                        "example.format_dialog_index",
                        format!(
                            "example {} must set target_message_index = {expected_index}",
                            self.id
                        ),
                    ));
                }
            }
        }
        issues
    }
}
