// file: src/runner/system.rs
// version: 1.0.0
// guid: 81ed5204-0b58-422a-8413-00074809a449

//! Local process execution via tokio

use super::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::{DeployError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// Runs commands on the local host
pub struct SystemRunner {
    timeout: Duration,
    use_sudo: bool,
}

impl SystemRunner {
    /// `use_sudo` only takes effect when the process is not already root
    pub fn new(timeout: Duration, use_sudo: bool) -> Self {
        Self {
            timeout,
            use_sudo: use_sudo && !is_root(),
        }
    }

    fn build(&self, spec: &CommandSpec) -> Command {
        let mut cmd = if spec.privileged && self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&spec.program);
            cmd
        } else {
            Command::new(&spec.program)
        };

        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Executing command: {}", spec);

        let output = tokio::time::timeout(self.timeout, self.build(spec).output())
            .await
            .map_err(|_| {
                DeployError::timeout(format!(
                    "'{}' did not finish within {}s",
                    spec,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DeployError::Process {
                command: spec.to_string(),
                exit_code: None,
                stderr: format!("Failed to execute command: {}", e),
            })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() {
            debug!("Command succeeded: {}", spec);
        } else {
            error!("Command failed with exit code {:?}: {}", result.exit_code, spec);
            if !result.stdout.trim().is_empty() {
                debug!("STDOUT: {}", result.stdout.trim());
            }
            if !result.stderr.trim().is_empty() {
                debug!("STDERR: {}", result.stderr.trim());
            }
        }

        Ok(result)
    }

    async fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Check if running as root
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
