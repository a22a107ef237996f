use evalforge_utils::error::{ConfigError, PipelineError};

use crate::model::Config;

impl Config {
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.pipeline.min_use_cases == 0 {
            return Err(PipelineError::Config(ConfigError::InvalidValue {
                key: "pipeline.min_use_cases".to_string(),
                value: "must be at least 1".to_string(),
            }));
        }
        if self.pipeline.min_test_cases_per_uc == 0 {
            return Err(PipelineError::Config(ConfigError::InvalidValue {
                key: "pipeline.min_test_cases_per_uc".to_string(),
                value: "must be at least 1".to_string(),
            }));
        }
        if self.pipeline.min_examples_per_tc == 0 {
            return Err(PipelineError::Config(ConfigError::InvalidValue {
                key: "pipeline.min_examples_per_tc".to_string(),
                value: "must be at least 1".to_string(),
            }));
        }
        if self.llm.primary.model.trim().is_empty() {
            return Err(PipelineError::Config(ConfigError::MissingRequired(
                "llm.primary.model".to_string(),
            )));
        }
        if self.llm.temperature != 0.0 {
            return Err(PipelineError::Config(ConfigError::InvalidValue {
                key: "llm.temperature".to_string(),
                value: "structured calls require temperature = 0".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigBuilder;

    #[test]
    fn zero_min_use_cases_is_rejected() {
        let err = ConfigBuilder::new()
            .input_path("a.md")
            .out_path("out")
            .min_use_cases(0)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn valid_config_builds() {
        let config = ConfigBuilder::new()
            .input_path("a.md")
            .out_path("out")
            .build();
        assert!(config.is_ok());
    }
}
