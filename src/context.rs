// file: src/context.rs
// version: 1.0.0
// guid: 31c6a2ee-73cd-492f-8cf5-4126e245ded5

//! Deployment context resolved once at pipeline start

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::runner::system::is_root;
use std::path::{Path, PathBuf};

/// Environment variables consulted, in order, for the invoking user
const USER_VARS: [&str; 3] = ["SUDO_USER", "USER", "LOGNAME"];

/// Immutable facts about the target host and application
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentContext {
    /// Application directory (absolute)
    pub app_dir: PathBuf,
    /// Account the service runs as
    pub user: String,
    pub group: String,
    pub service_name: String,
    pub interpreter: String,
    pub entry_module: String,
    pub venv_dir: PathBuf,
    pub requirements: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub log_dir: PathBuf,
    /// Unit descriptor template shipped with the application
    pub unit_template: PathBuf,
    /// Where the rendered unit is installed
    pub unit_path: PathBuf,
    /// Running as root on behalf of another account; files the service reads
    /// or writes must be handed over to `user:group` after creation
    pub hand_over_ownership: bool,
}

impl DeploymentContext {
    /// Resolve the context using the process environment for the user identity
    pub fn resolve(app_dir: &Path, config: &DeployConfig) -> Result<Self> {
        let user = invoking_user(|name| std::env::var(name).ok())?;
        let mut ctx = Self::resolve_for_user(app_dir, config, user)?;
        ctx.hand_over_ownership = is_root() && ctx.user != "root";
        Ok(ctx)
    }

    /// Resolve the context for an explicit user
    pub fn resolve_for_user(
        app_dir: &Path,
        config: &DeployConfig,
        user: impl Into<String>,
    ) -> Result<Self> {
        let app_dir = std::fs::canonicalize(app_dir).map_err(|e| {
            DeployError::config(format!(
                "Application directory {} is not accessible: {}",
                app_dir.display(),
                e
            ))
        })?;
        if !app_dir.is_dir() {
            return Err(DeployError::config(format!(
                "{} is not a directory",
                app_dir.display()
            )));
        }

        let user = user.into();
        let group = if config.service.group.trim().is_empty() {
            user.clone()
        } else {
            config.service.group.trim().to_string()
        };

        let unit_file = config.service.unit_file_name();
        let paths = &config.paths;

        Ok(Self {
            venv_dir: app_dir.join(&paths.venv_dir),
            requirements: app_dir.join(&paths.requirements),
            env_file: app_dir.join(&paths.env_file),
            env_template: app_dir.join(&paths.env_template),
            log_dir: app_dir.join(&paths.log_dir),
            unit_template: app_dir.join(&unit_file),
            unit_path: config.service.unit_dir.join(&unit_file),
            service_name: config.service.name.clone(),
            interpreter: config.runtime.interpreter.clone(),
            entry_module: config.runtime.entry_module.clone(),
            app_dir,
            user,
            group,
            hand_over_ownership: false,
        })
    }

    /// Interpreter inside the virtualenv
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir.join("bin").join("python")
    }

    pub fn venv_pip(&self) -> PathBuf {
        self.venv_dir.join("bin").join("pip")
    }

    /// `user:group` argument for chown
    pub fn owner(&self) -> String {
        format!("{}:{}", self.user, self.group)
    }

    /// Command an operator can use to start the application by hand
    pub fn manual_start_command(&self) -> String {
        format!(
            "cd {} && {} {}.py",
            self.app_dir.display(),
            self.venv_python().display(),
            self.entry_module
        )
    }
}

/// First non-empty, non-root user among `SUDO_USER`, `USER`, `LOGNAME`
///
/// `SUDO_USER` wins so that `sudo gateway-deploy` still installs the service
/// for the operator rather than for root.
pub fn invoking_user<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut fallback = None;
    for var in USER_VARS {
        if let Some(value) = lookup(var).map(|v| v.trim().to_string()) {
            if value.is_empty() {
                continue;
            }
            if value != "root" {
                return Ok(value);
            }
            if fallback.is_none() {
                fallback = Some(value);
            }
        }
    }

    fallback.ok_or_else(|| {
        DeployError::config("Cannot determine the invoking user (SUDO_USER/USER/LOGNAME unset)")
    })
}
