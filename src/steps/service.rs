// file: src/steps/service.rs
// version: 1.0.0
// guid: 2eab8144-96dd-4629-90f8-cb1fc9555444

//! Stages 7 and 8: systemd unit install and activation

use super::{utils, DeployState, Precondition, Stage, StageContext};
use crate::context::DeploymentContext;
use crate::error::{DeployError, Result};
use crate::readiness;
use crate::runner::CommandSpec;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

/// rw-r--r-- for the installed unit
pub const UNIT_FILE_MODE: &str = "644";

/// Directives forced to the deployment context inside `[Service]`
const SERVICE_DIRECTIVES: [&str; 3] = ["User", "Group", "WorkingDirectory"];

/// Render a unit template for this host
///
/// Substitutes `{{INSTALL_DIR}}`, `{{VENV_DIR}}`, `{{USER}}` and `{{GROUP}}`,
/// then rewrites (or inserts) `User=`, `Group=` and `WorkingDirectory=` in the
/// `[Service]` section. A hardcoded `WorkingDirectory=` in the template is
/// treated as the old install path and replaced throughout `[Service]`, so
/// `ExecStart=/home/pi/sms-gateway/venv/bin/python` follows the move.
pub fn render_unit(template: &str, ctx: &DeploymentContext) -> String {
    let app_dir = ctx.app_dir.to_string_lossy();
    let venv_dir = ctx.venv_dir.to_string_lossy();

    let substituted = template
        .replace("{{INSTALL_DIR}}", &app_dir)
        .replace("{{VENV_DIR}}", &venv_dir)
        .replace("{{USER}}", &ctx.user)
        .replace("{{GROUP}}", &ctx.group);

    let values = [ctx.user.as_str(), ctx.group.as_str(), &*app_dir];
    let old_root = template_working_dir(&substituted).filter(|old| *old != &*app_dir);
    let mut seen = [false; 3];
    let mut in_service = false;
    let mut out: Vec<String> = Vec::new();

    for line in substituted.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if in_service {
                insert_missing(&mut out, &values, &seen);
            }
            in_service = trimmed == "[Service]";
            out.push(line.to_string());
            continue;
        }

        if in_service {
            if let Some((key, _)) = trimmed.split_once('=') {
                if let Some(index) = SERVICE_DIRECTIVES.iter().position(|d| *d == key.trim()) {
                    out.push(format!("{}={}", SERVICE_DIRECTIVES[index], values[index]));
                    seen[index] = true;
                    continue;
                }
            }
            if let Some(old) = old_root {
                out.push(retarget(line, old, &app_dir));
                continue;
            }
        }

        out.push(line.to_string());
    }

    if in_service {
        insert_missing(&mut out, &values, &seen);
    }

    let mut rendered = out.join("\n");
    rendered.push('\n');
    rendered
}

/// `WorkingDirectory=` value of the `[Service]` section, without a trailing slash
fn template_working_dir(unit: &str) -> Option<&str> {
    let mut in_service = false;
    for line in unit.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_service = trimmed == "[Service]";
            continue;
        }
        if !in_service {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            if key.trim() == "WorkingDirectory" {
                // A leading '-' marks the directory as optional in systemd
                let value = value.trim().trim_start_matches('-').trim_end_matches('/');
                return if value.starts_with('/') && value.len() > 1 {
                    Some(value)
                } else {
                    None
                };
            }
        }
    }
    None
}

/// Replace `old` with `new` wherever it appears as a whole path prefix
fn retarget(line: &str, old: &str, new: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(pos) = rest.find(old) {
        let after = &rest[pos + old.len()..];
        let boundary = after
            .chars()
            .next()
            .map(|c| c == '/' || c.is_whitespace() || c == '"' || c == '\'' || c == ':')
            .unwrap_or(true);
        out.push_str(&rest[..pos]);
        out.push_str(if boundary { new } else { old });
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Append directives the section lacked, ahead of its trailing blank lines
fn insert_missing(out: &mut Vec<String>, values: &[&str; 3], seen: &[bool; 3]) {
    let mut blank = 0;
    while out.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        out.pop();
        blank += 1;
    }
    for (index, directive) in SERVICE_DIRECTIVES.iter().enumerate() {
        if !seen[index] {
            out.push(format!("{}={}", directive, values[index]));
        }
    }
    out.extend(std::iter::repeat(String::new()).take(blank));
}

/// Installs the rendered unit and reloads systemd
pub struct ServiceUnitStage;

#[async_trait::async_trait]
impl Stage for ServiceUnitStage {
    fn name(&self) -> &str {
        "service-unit"
    }

    fn description(&self) -> &str {
        "Install the systemd service unit"
    }

    async fn check(&self, ctx: &StageContext<'_>, _state: &DeployState) -> Result<Precondition> {
        let deployment = ctx.deployment;
        if !utils::file_exists(&deployment.unit_template).await {
            warn!(
                "Service descriptor {} not found",
                deployment.unit_template.display()
            );
            return Ok(Precondition::Skip(format!(
                "No {} found; start the API manually: {}",
                ctx.config.service.unit_file_name(),
                deployment.manual_start_command()
            )));
        }
        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, state: &mut DeployState) -> Result<String> {
        let deployment = ctx.deployment;
        let template = utils::read_file(&deployment.unit_template).await?;
        let rendered = render_unit(&template, deployment);

        let mut staged = tempfile::Builder::new()
            .prefix(&format!("{}-", deployment.service_name))
            .suffix(".service")
            .tempfile()?;
        staged.write_all(rendered.as_bytes())?;
        staged.flush()?;

        info!(
            "Installing {} to {}",
            deployment.unit_template.display(),
            deployment.unit_path.display()
        );
        ctx.runner
            .run_checked(
                &CommandSpec::new("install")
                    .args(["-m", UNIT_FILE_MODE])
                    .path_arg(staged.path())
                    .path_arg(&deployment.unit_path)
                    .privileged(),
            )
            .await?;

        ctx.runner
            .run_checked(&CommandSpec::systemctl(["daemon-reload"]))
            .await?;

        state.unit_installed = true;
        Ok(format!("Installed {}", deployment.unit_path.display()))
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Check sudo access and that {} is writable; the API can still be started manually: {}",
            ctx.config.service.unit_dir.display(),
            ctx.deployment.manual_start_command()
        )
    }
}

/// Enables, restarts and probes the service once
pub struct ActivationStage;

impl ActivationStage {
    async fn is_active(ctx: &StageContext<'_>) -> Result<(bool, String)> {
        let output = ctx
            .runner
            .run(&CommandSpec::systemctl([
                "is-active",
                ctx.deployment.service_name.as_str(),
            ]))
            .await?;
        Ok((output.success(), output.stdout.trim().to_string()))
    }
}

#[async_trait::async_trait]
impl Stage for ActivationStage {
    fn name(&self) -> &str {
        "activation"
    }

    fn description(&self) -> &str {
        "Enable and start the service"
    }

    async fn check(&self, _ctx: &StageContext<'_>, state: &DeployState) -> Result<Precondition> {
        if !state.unit_installed {
            return Ok(Precondition::Skip(
                "Service unit not installed; nothing to activate".to_string(),
            ));
        }
        Ok(Precondition::Proceed)
    }

    async fn execute(&self, ctx: &StageContext<'_>, state: &mut DeployState) -> Result<String> {
        let name = ctx.deployment.service_name.as_str();

        ctx.runner
            .run_checked(&CommandSpec::systemctl(["enable", name]))
            .await?;
        ctx.runner
            .run_checked(&CommandSpec::systemctl(["restart", name]))
            .await?;

        let delay = ctx.config.service.activation_delay();
        if delay > Duration::ZERO {
            info!("Waiting {}s for {} to settle", delay.as_secs(), name);
            tokio::time::sleep(delay).await;
        }

        let (active, reported) = Self::is_active(ctx).await?;
        if !active {
            let reported = if reported.is_empty() {
                "unknown".to_string()
            } else {
                reported
            };
            return Err(DeployError::service(format!(
                "{} is not active after restart (state: {})",
                name, reported
            )));
        }

        let status = ctx
            .runner
            .run(&CommandSpec::new("systemctl").args(["status", name, "--no-pager"]))
            .await?;
        state.service_status = Some(status.stdout.trim_end().to_string());

        if let Some(url) = ctx.config.readiness.url() {
            let timeout = Duration::from_secs(ctx.config.readiness.timeout_seconds);
            let report = readiness::probe(url, timeout).await?;
            state.health = Some(report);
            return Ok(format!("Service {} is active and {} is healthy", name, url));
        }

        Ok(format!("Service {} is active", name))
    }

    fn remediation(&self, ctx: &StageContext<'_>, _error: &DeployError) -> String {
        format!(
            "Inspect the service logs: sudo journalctl -u {} -n 50 --no-pager",
            ctx.deployment.service_name
        )
    }
}
