//! Upload interface.
//!
//! Pushing `dataset.json` to an external experiment-tracking service is an
//! external collaborator's job, not this crate's — this module exists only
//! so that collaborator knows exactly which manifest and example fields it
//! is allowed to read, without owning any HTTP client or credential
//! handling itself. [`ExperimentUploader`] is the seam an embedder
//! implements; [`read_upload_payload`] is the only thing this crate does:
//! load the already-written artifacts back into memory.

use camino::Utf8Path;
use evalforge_model::{DatasetExample, RunManifest};
use evalforge_utils::error::PipelineError;

use crate::artifacts_io::load_all;

/// Implemented by an external collaborator that knows how to talk to one
/// experiment-tracking service. This crate never implements it itself —
/// doing so would mean owning network calls and a second set of
/// credentials, which stay injected process-wide and are never read here.
#[async_trait::async_trait]
pub trait ExperimentUploader: Send + Sync {
    async fn upload(
        &self,
        dataset_name: &str,
        manifest: &RunManifest,
        examples: &[DatasetExample],
    ) -> Result<(), PipelineError>;
}

/// Load the fields an [`ExperimentUploader`] is expected to read: the
/// manifest (for `generator_version`, `llm`, `counts`, timestamps) and the
/// dataset examples themselves. Does not upload anything; callers pass the
/// result to their own `ExperimentUploader` implementation.
pub fn read_upload_payload(
    out_dir: &Utf8Path,
) -> Result<(RunManifest, Vec<DatasetExample>), PipelineError> {
    let loaded = load_all(out_dir)?;
    Ok((loaded.manifest, loaded.examples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts_io::write_all;
    use camino::Utf8PathBuf;
    use evalforge_model::{Case, Format, ManifestCounts, ManifestLlmInfo};

    fn manifest() -> RunManifest {
        RunManifest {
            input_path: "doc.md".to_string(),
            out_path: "out".to_string(),
            seed: None,
            timestamp: "2026-07-29T00:00:00Z".to_string(),
            generator_version: "1.0.0".to_string(),
            llm: ManifestLlmInfo {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4-5".to_string(),
                temperature: 0.0,
            },
            frameworks_used: vec![],
            counts: ManifestCounts::default(),
            detected_case: Case::SupportBot,
            detected_formats: vec![Format::SingleTurnQa],
        }
    }

    #[test]
    fn reads_manifest_and_examples_back_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();

        let (loaded_manifest, examples) = read_upload_payload(&out_dir).unwrap();
        assert_eq!(loaded_manifest, manifest());
        assert!(examples.is_empty());
    }
}
