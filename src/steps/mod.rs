// file: src/steps/mod.rs
// version: 1.0.0
// guid: 14eb3dba-97c9-4619-8ead-092f519ee09a

//! Deployment stages
//!
//! Each stage checks its own precondition and then acts. A precondition can
//! let the stage proceed, skip it (already done, or not applicable), or fail
//! outright; the pipeline treats any error as fatal.

pub mod configuration;
pub mod environment;
pub mod logs;
pub mod runtime;
pub mod service;
pub mod smoke;

pub use configuration::ConfigurationStage;
pub use environment::{DependencyStage, VirtualenvStage};
pub use logs::LogDirectoryStage;
pub use runtime::RuntimeCheckStage;
pub use service::{ActivationStage, ServiceUnitStage};
pub use smoke::SmokeTestStage;

use crate::config::DeployConfig;
use crate::context::DeploymentContext;
use crate::error::{DeployError, Result};
use crate::readiness::HealthReport;
use crate::runner::CommandRunner;
use crate::secret::ApiKey;
use std::time::Duration;
use uuid::Uuid;

/// Context passed to each stage
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    /// Current deployment session ID
    pub session_id: Uuid,

    /// Resolved paths and identity
    pub deployment: &'a DeploymentContext,

    /// Effective configuration
    pub config: &'a DeployConfig,

    /// Process runner for external commands
    pub runner: &'a dyn CommandRunner,
}

/// What earlier stages have set up so far
#[derive(Debug, Clone, Default)]
pub struct DeployState {
    /// Key generated in this run; None when an existing config was kept
    pub generated_key: Option<ApiKey>,

    /// `python3 --version` output
    pub interpreter_version: Option<String>,

    /// Unit file was rendered and installed
    pub unit_installed: bool,

    /// Captured `systemctl status` output once the service is active
    pub service_status: Option<String>,

    /// Health report when the readiness probe ran
    pub health: Option<HealthReport>,
}

/// Outcome of a precondition check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Run the stage
    Proceed,

    /// Nothing to do; the reason is shown to the operator
    Skip(String),
}

/// Result of executing a stage
#[derive(Debug, Clone)]
pub struct StageResult {
    /// 1-based position in the pipeline
    pub number: usize,

    pub name: String,

    /// Status of the stage execution
    pub status: StageStatus,

    /// Human-readable message describing the result
    pub message: String,

    /// Error message if the stage failed
    pub error_message: Option<String>,

    /// What the operator should do about a failure
    pub hint: Option<String>,

    /// Time taken to execute the stage
    pub execution_time: Duration,
}

/// Status of a stage execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage completed successfully
    Completed,

    /// Stage failed
    Failed,

    /// Stage was skipped (already done or not applicable)
    Skipped,
}

/// Trait for deployment stages
#[async_trait::async_trait]
pub trait Stage: Send + Sync {
    /// Get the name of this stage
    fn name(&self) -> &str;

    /// Get a description of what this stage does
    fn description(&self) -> &str;

    /// Decide whether the stage has work to do; errors abort the pipeline
    async fn check(&self, _ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        Ok(Precondition::Proceed)
    }

    /// Execute the stage, returning a one-line summary
    async fn execute(&self, ctx: &StageContext<'_>, state: &mut DeployState) -> Result<String>;

    /// Remediation hint shown when this stage fails
    fn remediation(&self, ctx: &StageContext<'_>, error: &DeployError) -> String;
}

/// The eight stages in execution order
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(RuntimeCheckStage),
        Box::new(VirtualenvStage),
        Box::new(DependencyStage),
        Box::new(ConfigurationStage),
        Box::new(LogDirectoryStage),
        Box::new(SmokeTestStage),
        Box::new(ServiceUnitStage),
        Box::new(ActivationStage),
    ]
}

/// Helper for creating successful stage results
pub fn success_result(
    number: usize,
    name: &str,
    message: String,
    execution_time: Duration,
) -> StageResult {
    StageResult {
        number,
        name: name.to_string(),
        status: StageStatus::Completed,
        message,
        error_message: None,
        hint: None,
        execution_time,
    }
}

/// Helper for creating failed stage results
pub fn failure_result(
    number: usize,
    name: &str,
    error: &DeployError,
    hint: String,
    execution_time: Duration,
) -> StageResult {
    StageResult {
        number,
        name: name.to_string(),
        status: StageStatus::Failed,
        message: format!("Stage {} ({}) failed", number, name),
        error_message: Some(error.to_string()),
        hint: Some(hint),
        execution_time,
    }
}

/// Helper for creating skipped stage results
pub fn skipped_result(number: usize, name: &str, reason: String) -> StageResult {
    StageResult {
        number,
        name: name.to_string(),
        status: StageStatus::Skipped,
        message: reason,
        error_message: None,
        hint: None,
        execution_time: Duration::from_secs(0),
    }
}

/// Filesystem helpers shared by stages
pub mod utils {
    use super::StageContext;
    use crate::error::{DeployError, Result};
    use crate::runner::CommandSpec;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tracing::debug;

    /// Check if a file exists
    pub async fn file_exists(path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Check if a directory exists
    pub async fn directory_exists(path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create a directory (and parents) and set its permission bits
    pub async fn ensure_directory(path: &Path, mode: u32) -> Result<()> {
        tokio::fs::create_dir_all(path).await.map_err(|e| {
            DeployError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {}", path.display(), e),
            ))
        })?;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        Ok(())
    }

    /// Give `path` (recursively) to the service account when running as root
    /// on its behalf; no-op otherwise
    pub async fn hand_over(ctx: &StageContext<'_>, path: &Path) -> Result<()> {
        let deployment = ctx.deployment;
        if !deployment.hand_over_ownership {
            return Ok(());
        }

        debug!("Handing {} to {}", path.display(), deployment.owner());
        ctx.runner
            .run_checked(
                &CommandSpec::new("chown")
                    .arg("-R")
                    .arg(deployment.owner())
                    .path_arg(path)
                    .privileged(),
            )
            .await?;
        Ok(())
    }

    /// Read content from a file
    pub async fn read_file(path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            DeployError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })
    }
}
