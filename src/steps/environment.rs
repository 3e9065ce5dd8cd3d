// file: src/steps/environment.rs
// version: 1.0.0
// guid: ce7b66d4-2e09-4cda-a3bd-c76c1a8e7165

//! Stages 2 and 3: virtualenv creation and dependency install

use super::{utils, DeployState, Precondition, Stage, StageContext};
use crate::error::{DeployError, Result};
use crate::runner::CommandSpec;
use tracing::info;

/// Creates the isolated dependency environment if it is missing
pub struct VirtualenvStage;

#[async_trait::async_trait]
impl Stage for VirtualenvStage {
    fn name(&self) -> &str {
        "virtualenv"
    }

    fn description(&self) -> &str {
        "Create the isolated Python environment"
    }

    async fn check(&self, ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        let venv_dir = &ctx.deployment.venv_dir;
        if utils::directory_exists(venv_dir).await {
            return Ok(Precondition::Skip(format!(
                "Virtual environment already exists at {}",
                venv_dir.display()
            )));
        }
        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, _state: &mut DeployState) -> Result<String> {
        let deployment = ctx.deployment;
        info!("Creating virtual environment at {}", deployment.venv_dir.display());

        ctx.runner
            .run_checked(
                &CommandSpec::new(&deployment.interpreter)
                    .args(["-m", "venv"])
                    .path_arg(&deployment.venv_dir)
                    .current_dir(&deployment.app_dir),
            )
            .await?;

        Ok(format!(
            "Created virtual environment at {}",
            deployment.venv_dir.display()
        ))
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Make sure the venv module is available (sudo apt install python3-venv) and that {} is writable",
            ctx.deployment.app_dir.display()
        )
    }
}

/// Upgrades pip and installs the pinned dependency manifest
pub struct DependencyStage;

#[async_trait::async_trait]
impl Stage for DependencyStage {
    fn name(&self) -> &str {
        "dependencies"
    }

    fn description(&self) -> &str {
        "Install Python dependencies"
    }

    async fn check(&self, ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        let manifest = &ctx.deployment.requirements;
        if !utils::file_exists(manifest).await {
            return Err(DeployError::missing(format!(
                "dependency manifest {} not found",
                manifest.display()
            )));
        }
        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, _state: &mut DeployState) -> Result<String> {
        let deployment = ctx.deployment;
        let pip = deployment.venv_pip();

        info!("Upgrading pip");
        ctx.runner
            .run_checked(
                &CommandSpec::new(pip.to_string_lossy())
                    .args(["install", "--upgrade", "pip"])
                    .current_dir(&deployment.app_dir),
            )
            .await?;

        info!("Installing {}", deployment.requirements.display());
        ctx.runner
            .run_checked(
                &CommandSpec::new(pip.to_string_lossy())
                    .args(["install", "-r"])
                    .path_arg(&deployment.requirements)
                    .current_dir(&deployment.app_dir),
            )
            .await?;

        // Covers the venv itself and everything pip just installed
        utils::hand_over(ctx, &deployment.venv_dir).await?;

        Ok(format!(
            "Installed dependencies from {}",
            deployment.requirements.display()
        ))
    }

    fn remediation(&self, ctx: &StageContext<'_>, error: &DeployError) -> String {
        match error {
            DeployError::MissingPrerequisite(_) => format!(
                "Add {} to the application directory and rerun",
                ctx.deployment.requirements.display()
            ),
            _ => format!(
                "Check network access and the pinned versions in {}, then rerun",
                ctx.deployment.requirements.display()
            ),
        }
    }
}
