//! Function-calling orchestrator: per-use-case variation routing,
//! format-adapter generation, supplementary-engine and direct-fallback
//! shortfall recovery, and per-use-case coverage enforcement.

pub mod assemble;
pub mod engines;
pub mod fallback;
pub mod generate;

pub use generate::{UseCaseOutput, generate_for_use_case};
