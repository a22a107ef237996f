//! Exit code constants for the thin CLI driver.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `SOURCE_IO` | Source document could not be read |
//! | 4 | `LLM_FAILURE` | LLM backend failed (transport, auth, retries exhausted) |
//! | 5 | `VALIDATION_FAILED` | `validate` found one or more integrity/coverage errors |
//! | 6 | `WRITE_IO` | Artifact emission failed |

use crate::error::PipelineError;

/// Type-safe exit code for `evalforge` CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: Self = Self(0);
    pub const INTERNAL: Self = Self(1);
    pub const CLI_ARGS: Self = Self(2);
    pub const SOURCE_IO: Self = Self(3);
    pub const LLM_FAILURE: Self = Self(4);
    pub const VALIDATION_FAILED: Self = Self(5);
    pub const WRITE_IO: Self = Self(6);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<&PipelineError> for ExitCode {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::SourceIo(_) => ExitCode::SOURCE_IO,
            PipelineError::Config(_) => ExitCode::CLI_ARGS,
            PipelineError::Llm(_) => ExitCode::LLM_FAILURE,
            PipelineError::WriteIo { .. } => ExitCode::WRITE_IO,
            PipelineError::ValidationFailed { .. } => ExitCode::VALIDATION_FAILED,
            PipelineError::StageFailed { .. } => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
    }

    #[test]
    fn source_io_maps_from_error() {
        let err = PipelineError::SourceIo(std::io::Error::other("boom"));
        assert_eq!(ExitCode::from(&err), ExitCode::SOURCE_IO);
    }
}
