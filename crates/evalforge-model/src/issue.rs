//! Re-export of the shared [`Issue`] shape under the name used throughout
//! this crate's `validate()` methods.

pub use evalforge_utils::types::Issue as ValidationIssue;
