//! evalforge — document-driven synthetic evaluation-dataset generation
//! pipeline.
//!
//! This crate is the thin CLI driver plus the final assembly stage of the
//! pipeline: source reading, extraction, detection, and per-use-case
//! generation each live in their own `evalforge-*` crate; this crate's
//! [`driver`] module sequences them, [`renumber`] imposes the
//! final cross-use-case id ordering, and [`artifacts_io`] writes the
//! five JSON artifacts and manifest atomically.

pub mod artifacts_io;
pub mod cli;
pub mod driver;
pub mod renumber;
pub mod upload;
pub mod validate;

pub use driver::{GenerateOutcome, generate};
pub use validate::validate as validate_artifacts;
