// file: src/steps/runtime.rs
// version: 1.0.0
// guid: c0f205c0-47a6-4a86-9b7d-580b0c05323c

//! Stage 1: runtime prerequisite

use super::{DeployState, Precondition, Stage, StageContext};
use crate::error::{DeployError, Result};
use crate::runner::CommandSpec;
use tracing::info;

/// Verifies the interpreter is on PATH and records its version
pub struct RuntimeCheckStage;

#[async_trait::async_trait]
impl Stage for RuntimeCheckStage {
    fn name(&self) -> &str {
        "runtime-check"
    }

    fn description(&self) -> &str {
        "Check that the Python runtime is installed"
    }

    async fn check(&self, ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        let interpreter = &ctx.deployment.interpreter;
        if !ctx.runner.program_exists(interpreter).await {
            return Err(DeployError::missing(format!(
                "{} not found on PATH",
                interpreter
            )));
        }
        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, state: &mut DeployState) -> Result<String> {
        let output = ctx
            .runner
            .run_checked(&CommandSpec::new(&ctx.deployment.interpreter).arg("--version"))
            .await?;

        // Python 2 prints its version on stderr
        let version = if output.stdout.trim().is_empty() {
            output.stderr.trim().to_string()
        } else {
            output.stdout.trim().to_string()
        };
        info!("Using interpreter: {}", version);

        let message = if version.is_empty() {
            format!("Found {}", ctx.deployment.interpreter)
        } else {
            format!("Found {}", version)
        };
        state.interpreter_version = Some(version);
        Ok(message)
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Install {} first: sudo apt install python3 python3-venv python3-pip",
            ctx.deployment.interpreter
        )
    }
}
