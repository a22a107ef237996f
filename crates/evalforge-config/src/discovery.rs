use std::collections::HashMap;
use std::path::{Path, PathBuf};

use evalforge_utils::error::{ConfigError, PipelineError};
use evalforge_utils::types::ConfigSource;
use serde::Deserialize;

use crate::cli_args::CliArgs;
use crate::model::{
    BackendConfig, Config, DEFAULT_ESCALATION_SENTENCE, ExperimentTrackerConfig, LlmConfig,
    PipelineDefaults, ProviderKind, Secret, default_model_for,
};

/// Shape of `evalforge.toml`: every field optional, since the file itself
/// is optional and any subset of it may be present.
#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    pipeline: Option<TomlPipeline>,
    #[serde(default)]
    llm: Option<TomlLlm>,
    #[serde(default)]
    experiment_tracker: Option<TomlTracker>,
    #[serde(default)]
    escalation_sentence: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlPipeline {
    min_use_cases: Option<usize>,
    min_test_cases_per_uc: Option<usize>,
    min_examples_per_tc: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlm {
    provider: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
    fallback_provider: Option<String>,
    fallback_model: Option<String>,
    fallback_api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlTracker {
    host: Option<String>,
    public_key_env: Option<String>,
    secret_key_env: Option<String>,
}

fn parse_provider(name: &str) -> Result<ProviderKind, PipelineError> {
    match name {
        "anthropic" => Ok(ProviderKind::Anthropic),
        "openrouter" => Ok(ProviderKind::OpenRouter),
        other => Err(PipelineError::Config(ConfigError::InvalidValue {
            key: "llm.provider".to_string(),
            value: format!("unknown provider '{other}' (expected anthropic or openrouter)"),
        })),
    }
}

/// Read an API key from the named environment variable, once, here. No
/// other component in this workspace is permitted to call `std::env::var`
/// for secrets.
fn read_api_key_env(var_name: &str) -> Option<Secret> {
    std::env::var(var_name).ok().map(Secret::from)
}

impl Config {
    /// Discover configuration with precedence CLI > `evalforge.toml` >
    /// built-in defaults, searching the current working directory for the
    /// config file unless `cli_args.config_path` names one explicitly.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, PipelineError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            PipelineError::Config(ConfigError::DiscoveryFailed {
                reason: e.to_string(),
            })
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Path-driven variant used by tests to avoid relying on the process's
    /// current directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, PipelineError> {
        let mut attribution: HashMap<String, ConfigSource> = HashMap::new();

        let config_path = cli_args
            .config_path
            .clone()
            .or_else(|| find_config_file(start_dir));

        let toml_config = match &config_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    PipelineError::Config(ConfigError::InvalidFile(format!(
                        "{}: {e}",
                        path.display()
                    )))
                })?;
                toml::from_str::<TomlConfig>(&text).map_err(|e| {
                    PipelineError::Config(ConfigError::InvalidFile(format!(
                        "{}: {e}",
                        path.display()
                    )))
                })?
            }
            None => TomlConfig::default(),
        };

        let input_path = cli_args.input_path.clone().ok_or_else(|| {
            PipelineError::Config(ConfigError::MissingRequired("input_path".to_string()))
        })?;
        let out_path = cli_args.out_path.clone().ok_or_else(|| {
            PipelineError::Config(ConfigError::MissingRequired("out_path".to_string()))
        })?;

        let seed = pick(
            "seed",
            cli_args.seed,
            toml_config.seed,
            None,
            &mut attribution,
        );

        let pipeline_toml = toml_config.pipeline.unwrap_or_default();
        let pipeline_defaults = PipelineDefaults::default();
        let pipeline = PipelineDefaults {
            min_use_cases: pick(
                "pipeline.min_use_cases",
                cli_args.min_use_cases,
                pipeline_toml.min_use_cases,
                Some(pipeline_defaults.min_use_cases),
                &mut attribution,
            )
            .unwrap_or(pipeline_defaults.min_use_cases),
            min_test_cases_per_uc: pick(
                "pipeline.min_test_cases_per_uc",
                cli_args.min_test_cases_per_uc,
                pipeline_toml.min_test_cases_per_uc,
                Some(pipeline_defaults.min_test_cases_per_uc),
                &mut attribution,
            )
            .unwrap_or(pipeline_defaults.min_test_cases_per_uc),
            min_examples_per_tc: pick(
                "pipeline.min_examples_per_tc",
                cli_args.min_examples_per_tc,
                pipeline_toml.min_examples_per_tc,
                Some(pipeline_defaults.min_examples_per_tc),
                &mut attribution,
            )
            .unwrap_or(pipeline_defaults.min_examples_per_tc),
        };

        let llm_toml = toml_config.llm.unwrap_or_default();
        let provider_name = pick(
            "llm.provider",
            cli_args.provider.clone(),
            llm_toml.provider.clone(),
            Some("anthropic".to_string()),
            &mut attribution,
        )
        .unwrap_or_else(|| "anthropic".to_string());
        let provider = parse_provider(&provider_name)?;

        let model = pick(
            "llm.model",
            cli_args.model.clone(),
            llm_toml.model.clone(),
            Some(default_model_for(provider).to_string()),
            &mut attribution,
        )
        .unwrap_or_else(|| default_model_for(provider).to_string());

        let api_key_env = llm_toml
            .api_key_env
            .clone()
            .unwrap_or_else(|| BackendConfig::default_api_key_env(provider).to_string());
        let api_key = read_api_key_env(&api_key_env);

        let primary = BackendConfig {
            provider,
            model,
            api_key,
            base_url: llm_toml.base_url.clone(),
            max_tokens: llm_toml.max_tokens.unwrap_or(4096),
        };

        let fallback = match (&llm_toml.fallback_provider, &llm_toml.fallback_model) {
            (Some(provider_name), Some(model)) => {
                let provider = parse_provider(provider_name)?;
                let api_key_env = llm_toml
                    .fallback_api_key_env
                    .clone()
                    .unwrap_or_else(|| BackendConfig::default_api_key_env(provider).to_string());
                Some(BackendConfig {
                    provider,
                    model: model.clone(),
                    api_key: read_api_key_env(&api_key_env),
                    base_url: None,
                    max_tokens: 4096,
                })
            }
            _ => None,
        };

        let llm = LlmConfig {
            primary,
            fallback,
            temperature: 0.0,
        };

        let experiment_tracker = toml_config.experiment_tracker.map(|t| {
            let public_key = t
                .public_key_env
                .as_deref()
                .and_then(read_api_key_env);
            let secret_key = t
                .secret_key_env
                .as_deref()
                .and_then(read_api_key_env);
            ExperimentTrackerConfig {
                host: t.host.unwrap_or_default(),
                public_key,
                secret_key,
            }
        });

        let escalation_sentence = toml_config
            .escalation_sentence
            .unwrap_or_else(|| DEFAULT_ESCALATION_SENTENCE.to_string());

        let config = Config {
            input_path,
            out_path,
            seed,
            llm,
            pipeline,
            experiment_tracker,
            escalation_sentence,
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            source_attribution: attribution,
        };

        config.validate()?;
        Ok(config)
    }
}

/// CLI > file > built-in default, recording which layer won in `attribution`.
fn pick<T: Clone>(
    key: &str,
    cli: Option<T>,
    file: Option<T>,
    default: Option<T>,
    attribution: &mut HashMap<String, ConfigSource>,
) -> Option<T> {
    if let Some(v) = cli {
        attribution.insert(key.to_string(), ConfigSource::Cli);
        return Some(v);
    }
    if let Some(v) = file {
        attribution.insert(key.to_string(), ConfigSource::File);
        return Some(v);
    }
    if default.is_some() {
        attribution.insert(key.to_string(), ConfigSource::Default);
    }
    default
}

fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = Some(start_dir.to_path_buf());
    while let Some(d) = dir {
        let candidate = d.join("evalforge.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent().map(Path::to_path_buf);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(input: &str, out: &str) -> CliArgs {
        CliArgs {
            input_path: Some(PathBuf::from(input)),
            out_path: Some(PathBuf::from(out)),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = cli("doc.md", "out");
        let config = Config::discover_from(dir.path(), &args).unwrap();
        assert_eq!(config.pipeline.min_use_cases, 5);
        assert_eq!(config.llm.primary.provider, ProviderKind::Anthropic);
        assert_eq!(config.source_of("pipeline.min_use_cases"), ConfigSource::Default);
    }

    #[test]
    fn cli_args_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("evalforge.toml")).unwrap();
        writeln!(file, "[pipeline]\nmin_use_cases = 9\n").unwrap();
        drop(file);

        let mut args = cli("doc.md", "out");
        args.min_use_cases = Some(2);
        let config = Config::discover_from(dir.path(), &args).unwrap();
        assert_eq!(config.pipeline.min_use_cases, 2);
        assert_eq!(config.source_of("pipeline.min_use_cases"), ConfigSource::Cli);
    }

    #[test]
    fn file_value_applies_when_no_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("evalforge.toml")).unwrap();
        writeln!(file, "[pipeline]\nmin_use_cases = 9\n").unwrap();
        drop(file);

        let args = cli("doc.md", "out");
        let config = Config::discover_from(dir.path(), &args).unwrap();
        assert_eq!(config.pipeline.min_use_cases, 9);
        assert_eq!(config.source_of("pipeline.min_use_cases"), ConfigSource::File);
    }

    #[test]
    fn missing_input_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            out_path: Some(PathBuf::from("out")),
            ..Default::default()
        };
        assert!(Config::discover_from(dir.path(), &args).is_err());
    }
}
