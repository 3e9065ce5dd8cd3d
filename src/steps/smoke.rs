// file: src/steps/smoke.rs
// version: 1.0.0
// guid: a2345d42-4c39-4272-9156-5b74cacb03a8

//! Stage 6: import smoke test

use super::{DeployState, Stage, StageContext};
use crate::error::{DeployError, Result};
use crate::runner::CommandSpec;

/// Imports the application entry module with the virtualenv interpreter
///
/// A clean import only proves the code and its dependencies load; runtime
/// health is checked after activation when a health URL is configured.
pub struct SmokeTestStage;

impl SmokeTestStage {
    fn import_command(ctx: &StageContext<'_>) -> CommandSpec {
        let deployment = ctx.deployment;
        CommandSpec::new(deployment.venv_python().to_string_lossy())
            .arg("-c")
            .arg(format!("import {}", deployment.entry_module))
            .current_dir(&deployment.app_dir)
    }
}

#[async_trait::async_trait]
impl Stage for SmokeTestStage {
    fn name(&self) -> &str {
        "smoke-test"
    }

    fn description(&self) -> &str {
        "Verify the application imports"
    }

    async fn execute(&self, ctx: &StageContext<'_>, _state: &mut DeployState) -> Result<String> {
        ctx.runner.run_checked(&Self::import_command(ctx)).await?;
        Ok(format!(
            "Module '{}' imports cleanly",
            ctx.deployment.entry_module
        ))
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Reproduce the failure with: cd {} && {}",
            ctx.deployment.app_dir.display(),
            Self::import_command(ctx)
        )
    }
}
