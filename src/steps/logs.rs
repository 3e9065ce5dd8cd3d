// file: src/steps/logs.rs
// version: 1.0.0
// guid: 4bd30bca-0c36-4ad0-b448-af4db39e02ce

//! Stage 5: log directory

use super::{utils, DeployState, Stage, StageContext};
use crate::error::{DeployError, Result};

/// rwxr-xr-x
pub const LOG_DIR_MODE: u32 = 0o755;

pub struct LogDirectoryStage;

#[async_trait::async_trait]
impl Stage for LogDirectoryStage {
    fn name(&self) -> &str {
        "log-directory"
    }

    fn description(&self) -> &str {
        "Prepare the log directory"
    }

    async fn execute(&self, ctx: &StageContext<'_>, _state: &mut DeployState) -> Result<String> {
        let log_dir = &ctx.deployment.log_dir;
        utils::ensure_directory(log_dir, LOG_DIR_MODE).await?;
        utils::hand_over(ctx, log_dir).await?;
        Ok(format!("Log directory ready at {}", log_dir.display()))
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Check that {} is writable by {}",
            ctx.deployment.app_dir.display(),
            ctx.deployment.user
        )
    }
}
