//! Variation routing, format adapters, and source classification (-):
//! turns a use case's variation axes into concrete [`TestCase`] parameter
//! combinations, generates a [`DatasetExample`] per combination through the
//! matching [`FormatAdapter`], and (for `support_bot`) classifies each
//! example's provenance.

pub mod adapter;
pub mod axes;
pub mod dialog_last_turn_correction;
pub mod prompt_common;
pub mod single_turn_qa;
pub mod single_utterance_correction;
pub mod source_classifier;
pub mod variation_router;

pub use adapter::{FormatAdapter, adapter_for};
pub use variation_router::{VariationCombination, route};
