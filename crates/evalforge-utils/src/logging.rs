//! Logging and observability infrastructure.
//!
//! Structured logging via `tracing`, initialized once at CLI startup. Library
//! code never calls `init_tracing` itself — only the thin CLI driver does —
//! so that `evalforge` remains embeddable in a host process with its own
//! subscriber.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Check if colored output should be used: stdout is a TTY and `NO_COLOR`
/// is not set.
fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise defaults to
/// `evalforge=debug,info` in verbose mode or `evalforge=info,warn` otherwise.
///
/// # Errors
///
/// Returns an error if a subscriber has already been installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("evalforge=debug,info")
            } else {
                EnvFilter::try_new("evalforge=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_ansi(use_color())
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
