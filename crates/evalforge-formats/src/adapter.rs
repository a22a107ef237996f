//! The shared format-adapter surface: `{generate_example, validate_format}`,
//! dispatched by `(format, case)` via [`adapter_for`].

use async_trait::async_trait;
use evalforge_llm::LlmBackend;
use evalforge_model::{Case, DatasetExample, Format, Policy, TestCase, UseCase, ValidationIssue};
use evalforge_utils::error::LlmError;

use crate::dialog_last_turn_correction::DialogLastTurnCorrectionAdapter;
use crate::single_turn_qa::SingleTurnQaAdapter;
use crate::single_utterance_correction::SingleUtteranceCorrectionAdapter;

/// Polymorphic surface every format adapter implements. Modeled as a
/// capability set dispatched by a lookup table rather than a class
/// hierarchy.
#[async_trait]
pub trait FormatAdapter: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn generate_example(
        &self,
        backend: &dyn LlmBackend,
        use_case: &UseCase,
        policies: &[Policy],
        test_case: &TestCase,
        example_id: String,
        model: &str,
        seed: Option<u64>,
        escalation_sentence: &str,
    ) -> Result<DatasetExample, LlmError>;

    /// Post-generation structural validation: never panics, returns every
    /// violation found.
    fn validate_format(&self, example: &DatasetExample) -> Vec<ValidationIssue>;
}

/// Look up the adapter for `(format, case)`. Case is accepted for
/// signature symmetry even though, today, format alone determines adapter
/// behavior — no case currently needs a distinct adapter for the same
/// format.
#[must_use]
pub fn adapter_for(format: Format, _case: Case) -> Box<dyn FormatAdapter> {
    match format {
        Format::SingleTurnQa => Box::new(SingleTurnQaAdapter),
        Format::SingleUtteranceCorrection => Box::new(SingleUtteranceCorrectionAdapter),
        Format::DialogLastTurnCorrection => Box::new(DialogLastTurnCorrectionAdapter),
    }
}
