// file: src/cli/commands.rs
// version: 1.0.0
// guid: a2c5e8f1-6d3b-4a79-91e4-0b7f2d6c8e35

//! Command implementations for the CLI

use crate::{
    cli::args::Cli,
    config::{ConfigLoader, DeployConfig},
    context::DeploymentContext,
    logging::logger::with_operation_span,
    pipeline::Pipeline,
    reporter::{self, ConsoleReporter},
    runner::system::SystemRunner,
    Result,
};
use colored::Colorize;
use std::time::Duration;
use tracing::info;

/// Build the effective configuration: files, environment, then flags
pub fn effective_config(cli: &Cli, loader: &ConfigLoader) -> Result<DeployConfig> {
    let mut config = loader.load(&cli.dir, cli.config.as_deref())?;

    if let Some(service) = &cli.service {
        config.service.name = service.clone();
    }
    if let Some(url) = &cli.health_url {
        config.readiness.health_url = url.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run the full deployment and return the process exit code
pub async fn deploy_command(cli: &Cli) -> Result<i32> {
    let config = effective_config(cli, &ConfigLoader::new())?;
    let deployment = DeploymentContext::resolve(&cli.dir, &config)?;

    info!(
        "Deploying {} from {} as {}",
        deployment.service_name,
        deployment.app_dir.display(),
        deployment.user
    );

    if !cli.quiet {
        println!(
            "{} {} in {}",
            "Deploying".bold(),
            deployment.service_name,
            deployment.app_dir.display()
        );
    }

    let runner = SystemRunner::new(
        Duration::from_secs(config.execution.timeout_seconds),
        config.service.use_sudo,
    );
    let pipeline = Pipeline::new();
    let progress = ConsoleReporter::new(cli.quiet);
    let report = with_operation_span("deploy", || {
        pipeline.run(&deployment, &config, &runner, &progress)
    })
    .await;

    reporter::print_summary(&report, &deployment);
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("deploy.toml"),
            "[service]\nname = \"from-file\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "gateway-deploy",
            "--dir",
            dir.path().to_str().unwrap(),
            "--service",
            "from-flag",
        ])
        .unwrap();

        let config = effective_config(&cli, &ConfigLoader::isolated()).unwrap();
        assert_eq!(config.service.name, "from-flag");
    }

    #[test]
    fn test_invalid_flag_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "gateway-deploy",
            "--dir",
            dir.path().to_str().unwrap(),
            "--service",
            "bad name",
        ])
        .unwrap();

        assert!(effective_config(&cli, &ConfigLoader::isolated()).is_err());
    }
}
