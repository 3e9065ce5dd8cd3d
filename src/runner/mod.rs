// file: src/runner/mod.rs
// version: 1.0.0
// guid: 442dc462-ac95-4325-bd39-99509dfe25a4

//! External command execution
//!
//! Every process the pipeline starts (virtualenv creation, pip, the smoke
//! test import, systemctl) goes through [`CommandRunner`], so tests can swap
//! in a recording fake.

pub mod system;

pub use system::SystemRunner;

use crate::error::{DeployError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Needs root; the runner decides whether that means sudo
    pub privileged: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            privileged: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path argument, kept lossless for display purposes
    pub fn path_arg(self, path: &Path) -> Self {
        let rendered = path.to_string_lossy().into_owned();
        self.arg(rendered)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// `systemctl <args>` run as root
    pub fn systemctl<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("systemctl").args(args).privileged()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// None when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stderr if present, otherwise stdout
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Trait for executing commands on the deployment host
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion; only spawn failures are errors
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// Check whether a program resolves on PATH
    async fn program_exists(&self, program: &str) -> bool;

    /// Run a command and fail on a non-zero exit status
    async fn run_checked(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(command).await?;
        if !output.success() {
            return Err(DeployError::Process {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.diagnostics().to_string(),
            });
        }
        Ok(output)
    }
}
