// file: src/reporter/mod.rs
// version: 1.0.0
// guid: 96b6d524-1d1e-4d8a-829f-7728f20d1ce7

//! Operator-facing console output
//!
//! Diagnostics go through `tracing`; this module owns the status lines, the
//! abort hint and the closing summary the operator reads.

use crate::config::EnvFile;
use crate::context::DeploymentContext;
use crate::pipeline::PipelineReport;
use crate::steps::{Stage, StageResult, StageStatus};
use colored::Colorize;
use std::io::Write;

/// Header used by the deployed API for authentication
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Port the API listens on when `.env` does not say otherwise
pub const DEFAULT_PORT: &str = "8000";

/// Receives progress as the pipeline moves through its stages
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, number: usize, total: usize, stage: &dyn Stage);
    fn stage_finished(&self, result: &StageResult);
}

/// Prints one status line per stage to stdout, failures to stderr
///
/// In quiet mode only failures are printed.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn stage_started(&self, number: usize, total: usize, stage: &dyn Stage) {
        if self.quiet {
            return;
        }
        println!(
            "{} {}",
            format!("[{}/{}]", number, total).bold(),
            stage.description()
        );
    }

    fn stage_finished(&self, result: &StageResult) {
        match result.status {
            StageStatus::Completed | StageStatus::Skipped if self.quiet => {}
            StageStatus::Completed => println!("  {} {}", "✓".green(), result.message),
            StageStatus::Skipped => println!("  {} {}", "-".yellow(), result.message),
            StageStatus::Failed => {
                eprintln!(
                    "  {} {}: {}",
                    "✗".red(),
                    result.message,
                    result.error_message.as_deref().unwrap_or("unknown error")
                );
                if let Some(hint) = &result.hint {
                    eprintln!("    {} {}", "Hint:".yellow().bold(), hint);
                }
            }
        }
    }
}

/// Reporter that prints nothing
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn stage_started(&self, _number: usize, _total: usize, _stage: &dyn Stage) {}
    fn stage_finished(&self, _result: &StageResult) {}
}

/// Base URL operators should use to reach the API
pub fn api_base_url(env: Option<&EnvFile>) -> String {
    let host = env
        .and_then(|e| e.get("HOST"))
        .filter(|h| !h.is_empty() && h != "0.0.0.0" && h != "::")
        .unwrap_or_else(|| "localhost".to_string());
    let port = env
        .and_then(|e| e.get("PORT"))
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    format!("http://{}:{}", host, port)
}

/// Closing summary for a finished run
///
/// The generated key, if any, appears here and nowhere else in the output.
pub fn render_summary(report: &PipelineReport, ctx: &DeploymentContext) -> String {
    let mut out = String::new();
    let seconds = report.duration().num_milliseconds() as f64 / 1000.0;

    if let Some(failed) = report.failure() {
        out.push_str(&format!(
            "\n{} at stage {} ({}) after {:.1}s\n",
            "Deployment aborted".red().bold(),
            failed.number,
            failed.name,
            seconds
        ));
        out.push_str("Completed stages are left in place; rerun once the problem is fixed.\n");
    } else {
        out.push_str(&format!(
            "\n{} in {:.1}s (session {})\n",
            "Deployment complete".green().bold(),
            seconds,
            report.session_id
        ));

        if report.deploy.unit_installed {
            let name = &ctx.service_name;
            out.push_str(&format!("\nService {} is active\n", name.bold()));
            if let Some(status) = &report.deploy.service_status {
                for line in status.lines().take(3) {
                    out.push_str(&format!("  {}\n", line));
                }
            }
            if let Some(health) = &report.deploy.health {
                out.push_str(&format!(
                    "  health: {} (version {})\n",
                    health.status,
                    health.version.as_deref().unwrap_or("unknown")
                ));
            }

            let env = EnvFile::load(&ctx.env_file).ok();
            let base = api_base_url(env.as_ref());
            out.push_str(&format!("\nAPI:      {}\n", base));
            out.push_str(&format!("Health:   curl {}/health\n", base));
            out.push_str(&format!(
                "Commands: curl -H '{}: <API_KEY>' {}/api/v1/commands\n",
                API_KEY_HEADER, base
            ));

            out.push_str("\nUseful commands:\n");
            out.push_str(&format!("  sudo systemctl status {}\n", name));
            out.push_str(&format!("  sudo systemctl restart {}\n", name));
            out.push_str(&format!("  sudo systemctl stop {}\n", name));
            out.push_str(&format!("  sudo journalctl -u {} -f\n", name));
        } else {
            out.push_str("\nNo service unit was installed. Start the API manually:\n");
            out.push_str(&format!("  {}\n", ctx.manual_start_command()));
        }
    }

    if let Some(key) = &report.deploy.generated_key {
        out.push_str(&format!(
            "\n{} {}\n",
            "Generated API key (stored in .env, shown once):".yellow().bold(),
            key.expose()
        ));
    }

    out
}

/// Print the summary to stdout (or stderr for an aborted run)
pub fn print_summary(report: &PipelineReport, ctx: &DeploymentContext) {
    let summary = render_summary(report, ctx);
    if report.succeeded() {
        print!("{}", summary);
        let _ = std::io::stdout().flush();
    } else {
        eprint!("{}", summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_defaults() {
        assert_eq!(api_base_url(None), "http://localhost:8000");

        let env = EnvFile::parse("HOST=0.0.0.0\nPORT=9000\n");
        assert_eq!(api_base_url(Some(&env)), "http://localhost:9000");

        let env = EnvFile::parse("HOST=gateway.local\n");
        assert_eq!(api_base_url(Some(&env)), "http://gateway.local:8000");
    }
}
