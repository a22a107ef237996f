//! [`RunManifest`] — written once at pipeline end.

use serde::{Deserialize, Serialize};

use crate::enums::{Case, Format};

/// `manifest.llm` — provider/model/temperature the run used. Temperature is
/// always `0` per the structured-call contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestLlmInfo {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

/// `manifest.counts` — must equal the actual lengths of the four
/// collections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ManifestCounts {
    pub use_cases: usize,
    pub policies: usize,
    pub test_cases: usize,
    pub dataset_examples: usize,
}

/// Run manifest, written atomically alongside the five artifact files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub input_path: String,
    pub out_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub timestamp: String,
    pub generator_version: String,
    pub llm: ManifestLlmInfo,
    pub frameworks_used: Vec<String>,
    pub counts: ManifestCounts,
    pub detected_case: Case,
    pub detected_formats: Vec<Format>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = RunManifest {
            input_path: "doc.md".to_string(),
            out_path: "out".to_string(),
            seed: Some(42),
            timestamp: "2026-07-29T00:00:00Z".to_string(),
            generator_version: "1.0.0".to_string(),
            llm: ManifestLlmInfo {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4-5".to_string(),
                temperature: 0.0,
            },
            frameworks_used: vec!["format_adapter".to_string()],
            counts: ManifestCounts {
                use_cases: 5,
                policies: 5,
                test_cases: 15,
                dataset_examples: 15,
            },
            detected_case: Case::SupportBot,
            detected_formats: vec![Format::SingleTurnQa],
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let back: RunManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, back);
    }
}
