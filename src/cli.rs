//! Thin CLI driver. Everything here is argument parsing, logging setup, and exit
//! code mapping; the actual pipeline lives in [`crate::driver`] and
//! [`crate::validate`]. An embedder that wants the pipeline without a CLI
//! can call those modules directly and never touch this one.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use evalforge_config::{CliArgs, Config};
use evalforge_utils::exit_codes::ExitCode;
use evalforge_utils::logging::init_tracing;

/// evalforge — document-driven synthetic evaluation-dataset generation.
#[derive(Parser)]
#[command(name = "evalforge")]
#[command(version)]
#[command(about = "Turn a requirements document into an evidence-traceable evaluation dataset")]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write use_cases.json, policies.json,
    /// test_cases.json, dataset.json, and run_manifest.json.
    Generate {
        /// Path to the Russian-language requirements document (Markdown).
        input: PathBuf,

        /// Output directory for the five artifacts and the manifest.
        #[arg(long = "out")]
        out: PathBuf,

        /// Path to an explicit evalforge.toml, bypassing upward discovery.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Deterministic seed threaded through every structured call and
        /// the variation router.
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured model identifier.
        #[arg(long)]
        model: Option<String>,

        /// Override the configured LLM provider ("anthropic" or
        /// "openrouter").
        #[arg(long)]
        provider: Option<String>,

        /// Minimum number of use cases the extractor must produce.
        #[arg(long)]
        min_use_cases: Option<usize>,

        /// Minimum test cases synthesised per use case.
        #[arg(long)]
        min_test_cases_per_uc: Option<usize>,

        /// Minimum dataset examples generated per test case per format.
        #[arg(long)]
        min_examples_per_tc: Option<usize>,
    },

    /// Re-check an already-generated output directory: referential
    /// integrity, format coverage, and source coverage, all at error
    /// severity.
    Validate {
        /// Output directory containing a previous generate run's artifacts.
        out: PathBuf,
    },
}

/// Parse arguments, run the requested operation, and return the exit code
/// the process should terminate with. All user-facing output (including
/// error messages) happens here or in the stages it calls; `main` only
/// maps the result to `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let _ = init_tracing(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().map_err(|_| ExitCode::INTERNAL)?;

    match cli.command {
        Commands::Generate {
            input,
            out,
            config,
            seed,
            model,
            provider,
            min_use_cases,
            min_test_cases_per_uc,
            min_examples_per_tc,
        } => {
            let cli_args = CliArgs {
                input_path: Some(input),
                out_path: Some(out),
                config_path: config,
                seed,
                model,
                provider,
                min_use_cases,
                min_test_cases_per_uc,
                min_examples_per_tc,
            };
            let config = Config::discover(&cli_args).map_err(|e| {
                tracing::error!(%e, "configuration error");
                ExitCode::CLI_ARGS
            })?;

            runtime.block_on(run_generate(&config))
        }
        Commands::Validate { out } => runtime.block_on(run_validate(&out)),
    }
}

async fn run_generate(config: &Config) -> Result<(), ExitCode> {
    match crate::driver::generate(config).await {
        Ok(outcome) => {
            println!(
                "generated {} use case(s), {} policies, {} test case(s), {} example(s) ({} warning(s))",
                outcome.manifest.counts.use_cases,
                outcome.manifest.counts.policies,
                outcome.manifest.counts.test_cases,
                outcome.manifest.counts.dataset_examples,
                outcome.warnings.len(),
            );
            Ok(())
        }
        Err(error) => {
            tracing::error!(%error, "generation failed");
            Err(ExitCode::from(&error))
        }
    }
}

async fn run_validate(out: &std::path::Path) -> Result<(), ExitCode> {
    let out_dir = camino::Utf8Path::from_path(out).ok_or(ExitCode::CLI_ARGS)?;
    match crate::validate::validate(out_dir) {
        Ok(report) => {
            println!(
                "{} error(s), {} warning(s) across {} use case(s), {} policies, {} test case(s), {} example(s)",
                report.errors.len(),
                report.warnings.len(),
                report.counts.use_cases,
                report.counts.policies,
                report.counts.test_cases,
                report.counts.dataset_examples,
            );
            for error in &report.errors {
                eprintln!("error[{}]: {}", error.code, error.message);
            }
            for warning in &report.warnings {
                eprintln!("warning[{}]: {}", warning.code, warning.message);
            }
            if report.is_success() {
                Ok(())
            } else {
                Err(ExitCode::VALIDATION_FAILED)
            }
        }
        Err(error) => {
            tracing::error!(%error, "validation failed to run");
            Err(ExitCode::from(&error))
        }
    }
}
