//! Top-level JSON shapes of the five artifact files. Each wraps its
//! collection in a single named key so the file's root is always an
//! object, never a bare array.

use serde::{Deserialize, Serialize};

use crate::entities::{DatasetExample, Policy, TestCase, UseCase};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UseCasesFile {
    pub use_cases: Vec<UseCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PoliciesFile {
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TestCasesFile {
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DatasetFile {
    pub examples: Vec<DatasetExample>,
}
