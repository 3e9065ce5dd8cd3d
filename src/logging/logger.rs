// file: src/logging/logger.rs
// version: 1.0.0
// guid: 0c7e2a94-3b51-4f6d-8e27-9a1d5c3f6b80

//! Logger initialization and configuration
//!
//! Diagnostics are written to stderr so they never interleave with the
//! status lines and summary printed on stdout.

use crate::error::{DeployError, Result};
use tracing::Instrument;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the given verbosity; `RUST_LOG` wins when set
fn level_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Initialize human-readable logging
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(level_filter(verbose, quiet))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| DeployError::config(format!("Failed to initialize logger: {}", e)))?;

    Ok(())
}

/// Initialize structured JSON logging (for CI and log shippers)
pub fn init_json_logger(verbose: bool, quiet: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(level_filter(verbose, quiet))
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true),
        )
        .try_init()
        .map_err(|e| DeployError::config(format!("Failed to initialize JSON logger: {}", e)))?;

    Ok(())
}

/// Run an async operation inside a named span
pub async fn with_operation_span<F, Fut, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    let span = tracing::info_span!("operation", name = operation);
    async move { f().await }.instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_only_once() {
        // A global subscriber can be set once per process; later calls must
        // report an error rather than panic.
        let first = init_logger(false, false);
        let second = init_logger(true, false);
        assert!(first.is_err() || second.is_err());
        assert!(init_json_logger(false, true).is_err());
    }

    #[tokio::test]
    async fn test_with_operation_span() {
        let result = with_operation_span("deploy", || async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            42
        })
        .await;

        assert_eq!(result, 42);
    }
}
