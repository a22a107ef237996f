//! Output directory layout: five UTF-8, 2-space-indented JSON files
//! plus `run_manifest.json`, written atomically as a *set* — every file
//! is written into a fresh temp subdirectory next to the target (each
//! file itself written via [`evalforge_utils::atomic_write`]), and only
//! once all six are safely on disk is the whole temp directory renamed
//! into place. A crash or I/O failure at any point before that final
//! rename leaves the target directory untouched (or absent); it never
//! leaves a partial artifact set.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use evalforge_model::{
    DatasetExample, DatasetFile, Policy, PoliciesFile, RunManifest, TestCase, TestCasesFile,
    UseCase, UseCasesFile,
};
use evalforge_utils::atomic_write::write_file_atomic;
use evalforge_utils::error::PipelineError;

const USE_CASES_FILE: &str = "use_cases.json";
const POLICIES_FILE: &str = "policies.json";
const TEST_CASES_FILE: &str = "test_cases.json";
const DATASET_FILE: &str = "dataset.json";
const MANIFEST_FILE: &str = "run_manifest.json";

fn to_pretty_json<T: serde::Serialize>(value: &T, path: &str) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value).map_err(|e| PipelineError::WriteIo {
        path: path.to_string(),
        reason: format!("failed to serialize: {e}"),
    })
}

fn write_one(out_dir: &Utf8Path, file_name: &str, content: &str) -> Result<(), PipelineError> {
    let path = out_dir.join(file_name);
    write_file_atomic(&path, content).map_err(|e| PipelineError::WriteIo {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn write_io_err(path: &Utf8Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::WriteIo {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Write all five artifacts plus the manifest as a single atomic unit.
/// Every file is serialized to a string first (so a serialization failure
/// happens before anything touches disk), then all six are written into a
/// fresh temp directory next to `out_dir`. Only once every file is on disk
/// does the temp directory get renamed into place; if `out_dir` already
/// holds a previous run, it is moved aside first and restored on failure,
/// so a crash anywhere in this sequence leaves either the previous run's
/// artifacts, this run's artifacts, or nothing — never a mix of the two.
pub fn write_all(
    out_dir: &Utf8Path,
    use_cases: &[UseCase],
    policies: &[Policy],
    test_cases: &[TestCase],
    examples: &[DatasetExample],
    manifest: &RunManifest,
) -> Result<(), PipelineError> {
    let use_cases_json = to_pretty_json(
        &UseCasesFile {
            use_cases: use_cases.to_vec(),
        },
        USE_CASES_FILE,
    )?;
    let policies_json = to_pretty_json(
        &PoliciesFile {
            policies: policies.to_vec(),
        },
        POLICIES_FILE,
    )?;
    let test_cases_json = to_pretty_json(
        &TestCasesFile {
            test_cases: test_cases.to_vec(),
        },
        TEST_CASES_FILE,
    )?;
    let dataset_json = to_pretty_json(
        &DatasetFile {
            examples: examples.to_vec(),
        },
        DATASET_FILE,
    )?;
    let manifest_json = to_pretty_json(manifest, MANIFEST_FILE)?;

    let parent = out_dir.parent().unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|e| write_io_err(out_dir, format!("failed to create {parent}: {e}")))?;

    // Everything lands in this temp directory first; if any write below
    // fails, `temp_dir` drops here and removes itself, touching `out_dir`
    // not at all.
    let temp_dir = tempfile::Builder::new()
        .prefix(".evalforge-artifacts-")
        .tempdir_in(parent)
        .map_err(|e| write_io_err(out_dir, format!("failed to create temp output directory: {e}")))?;
    let temp_path = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
        .map_err(|_| write_io_err(out_dir, "temp output path is not valid UTF-8"))?;

    write_one(&temp_path, USE_CASES_FILE, &use_cases_json)?;
    write_one(&temp_path, POLICIES_FILE, &policies_json)?;
    write_one(&temp_path, TEST_CASES_FILE, &test_cases_json)?;
    write_one(&temp_path, DATASET_FILE, &dataset_json)?;
    write_one(&temp_path, MANIFEST_FILE, &manifest_json)?;

    // All six files are safely on disk under `temp_path`. Persist it (stop
    // its drop from deleting the directory) and swap it into place.
    let temp_path_buf = temp_dir.into_path();

    let backup = out_dir.exists().then(|| parent.join(format!(
        ".evalforge-artifacts-backup-{}",
        out_dir.file_name().unwrap_or("out")
    )));
    if let Some(backup) = &backup {
        let _ = fs::remove_dir_all(backup);
        fs::rename(out_dir, backup).map_err(|e| {
            let _ = fs::remove_dir_all(&temp_path_buf);
            write_io_err(out_dir, format!("failed to move aside previous artifact set: {e}"))
        })?;
    }

    match fs::rename(&temp_path_buf, out_dir.as_std_path()) {
        Ok(()) => {
            if let Some(backup) = &backup {
                let _ = fs::remove_dir_all(backup);
            }
            Ok(())
        }
        Err(e) => {
            // Restore whatever was there before so a failed swap never
            // leaves `out_dir` in a partial or missing state.
            if let Some(backup) = &backup {
                let _ = fs::rename(backup, out_dir);
            }
            let _ = fs::remove_dir_all(&temp_path_buf);
            Err(write_io_err(
                out_dir,
                format!("failed to rename artifact directory into place: {e}"),
            ))
        }
    }
}

/// Loaded artifact set, returned by [`load_all`] for the standalone
/// validator and by any other embedder that wants to re-read a
/// finished run.
pub struct LoadedArtifacts {
    pub use_cases: Vec<UseCase>,
    pub policies: Vec<Policy>,
    pub test_cases: Vec<TestCase>,
    pub examples: Vec<DatasetExample>,
    pub manifest: RunManifest,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8PathBuf) -> Result<T, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::WriteIo {
        path: path.to_string(),
        reason: format!("failed to read: {e}"),
    })?;
    serde_json::from_str(&text).map_err(|e| PipelineError::WriteIo {
        path: path.to_string(),
        reason: format!("failed to parse JSON: {e}"),
    })
}

/// Load the five artifacts plus the manifest from `out_dir` for the
/// standalone validator, which loads the five JSON files with the same
/// schemas used when writing them.
pub fn load_all(out_dir: &Utf8Path) -> Result<LoadedArtifacts, PipelineError> {
    let use_cases: UseCasesFile = read_json(&out_dir.join(USE_CASES_FILE))?;
    let policies: PoliciesFile = read_json(&out_dir.join(POLICIES_FILE))?;
    let test_cases: TestCasesFile = read_json(&out_dir.join(TEST_CASES_FILE))?;
    let dataset: DatasetFile = read_json(&out_dir.join(DATASET_FILE))?;
    let manifest: RunManifest = read_json(&out_dir.join(MANIFEST_FILE))?;

    Ok(LoadedArtifacts {
        use_cases: use_cases.use_cases,
        policies: policies.policies,
        test_cases: test_cases.test_cases,
        examples: dataset.examples,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalforge_model::{Case, Format, ManifestCounts, ManifestLlmInfo};

    fn manifest() -> RunManifest {
        RunManifest {
            input_path: "doc.md".to_string(),
            out_path: "out".to_string(),
            seed: Some(1),
            timestamp: "2026-07-29T00:00:00Z".to_string(),
            generator_version: "1.0.0".to_string(),
            llm: ManifestLlmInfo {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4-5".to_string(),
                temperature: 0.0,
            },
            frameworks_used: vec!["format_adapter".to_string()],
            counts: ManifestCounts::default(),
            detected_case: Case::SupportBot,
            detected_formats: vec![Format::SingleTurnQa],
        }
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();

        let loaded = load_all(&out_dir).unwrap();
        assert!(loaded.use_cases.is_empty());
        assert_eq!(loaded.manifest, manifest());
    }

    #[test]
    fn written_json_is_two_space_indented_and_keeps_unicode_literal() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();

        let text = std::fs::read_to_string(out_dir.join(MANIFEST_FILE)).unwrap();
        assert!(text.contains("  \"input_path\""));
    }

    #[test]
    fn write_all_creates_a_fresh_nonexistent_out_dir() {
        let parent = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(parent.path().join("fresh_run")).unwrap();
        assert!(!out_dir.exists());

        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();

        assert!(out_dir.join(MANIFEST_FILE).exists());
        assert!(out_dir.join(USE_CASES_FILE).exists());
    }

    #[test]
    fn rerunning_write_all_replaces_the_previous_artifact_set_wholesale() {
        let parent = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(parent.path().join("run")).unwrap();

        let mut first_manifest = manifest();
        first_manifest.seed = Some(1);
        write_all(&out_dir, &[], &[], &[], &[], &first_manifest).unwrap();

        let mut second_manifest = manifest();
        second_manifest.seed = Some(2);
        write_all(&out_dir, &[], &[], &[], &[], &second_manifest).unwrap();

        let loaded = load_all(&out_dir).unwrap();
        assert_eq!(loaded.manifest.seed, Some(2));
    }

    #[test]
    fn write_all_leaves_no_temp_or_backup_directories_behind() {
        let parent = tempfile::tempdir().unwrap();
        let out_dir = Utf8PathBuf::from_path_buf(parent.path().join("run")).unwrap();

        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();
        write_all(&out_dir, &[], &[], &[], &[], &manifest()).unwrap();

        let siblings: Vec<String> = std::fs::read_dir(parent.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(siblings, vec!["run".to_string()]);
    }
}
