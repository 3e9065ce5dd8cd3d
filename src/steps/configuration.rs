// file: src/steps/configuration.rs
// version: 1.0.0
// guid: f8144fe9-39b2-4143-995d-b420703945d2

//! Stage 4: configuration file with a generated API key

use super::{utils, DeployState, Precondition, Stage, StageContext};
use crate::config::EnvFile;
use crate::error::{DeployError, Result};
use crate::secret::{ApiKey, API_KEY_VAR};
use tracing::info;

/// rw------- since the file holds the API key
pub const ENV_FILE_MODE: u32 = 0o600;

/// Materializes `.env` from its template exactly once
///
/// An existing file is never touched, so the key stays stable across
/// redeploys.
pub struct ConfigurationStage;

#[async_trait::async_trait]
impl Stage for ConfigurationStage {
    fn name(&self) -> &str {
        "configuration"
    }

    fn description(&self) -> &str {
        "Create the configuration file"
    }

    async fn check(&self, ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        let deployment = ctx.deployment;
        if utils::file_exists(&deployment.env_file).await {
            return Ok(Precondition::Skip(format!(
                "Keeping existing {} (API key unchanged)",
                deployment.env_file.display()
            )));
        }

        if !utils::file_exists(&deployment.env_template).await {
            return Err(DeployError::missing(format!(
                "neither {} nor {} exists",
                deployment.env_file.display(),
                deployment.env_template.display()
            )));
        }

        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, state: &mut DeployState) -> Result<String> {
        let deployment = ctx.deployment;
        let template = utils::read_file(&deployment.env_template).await?;

        let key = ApiKey::generate();
        let mut env = EnvFile::parse(&template);
        env.set(API_KEY_VAR, key.expose());
        env.save(&deployment.env_file, ENV_FILE_MODE)?;

        info!(
            "Wrote {} from {}",
            deployment.env_file.display(),
            deployment.env_template.display()
        );
        // Record the key before anything else can fail; the file already holds it
        state.generated_key = Some(key);
        utils::hand_over(ctx, &deployment.env_file).await?;

        Ok(format!(
            "Created {} with a new {}",
            deployment.env_file.display(),
            API_KEY_VAR
        ))
    }

    fn remediation(&self, ctx: &StageContext<'_>, error: &DeployError) -> String {
        match error {
            DeployError::MissingPrerequisite(_) => format!(
                "Restore {} from the repository, or create {} by hand with an {} entry",
                ctx.deployment.env_template.display(),
                ctx.deployment.env_file.display(),
                API_KEY_VAR
            ),
            _ => format!(
                "Check that {} is writable",
                ctx.deployment.app_dir.display()
            ),
        }
    }
}
