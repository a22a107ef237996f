//! Shared, dependency-light utilities used across every pipeline crate:
//! error types, exit codes, logging setup, atomic file writes, and small
//! serializable helper types. Nothing here knows about use cases, policies,
//! or the LLM — those live in their own crates.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
