// file: src/config/loader.rs
// version: 1.0.0
// guid: f8a85d32-325e-45d3-9059-5a28ec2b0a8b

//! Layered configuration loading with environment variable substitution

use super::DeployConfig;
use crate::error::{DeployError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Project-level configuration file looked up in the application directory
pub const PROJECT_CONFIG_FILE: &str = "deploy.toml";

/// Configuration loader: defaults, user file, project file, explicit file, env
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
    user_config: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
            user_config: Self::user_config_path(),
        }
    }

    /// Loader that ignores the process environment and the user config file
    pub fn isolated() -> Self {
        Self {
            env_vars: HashMap::new(),
            user_config: None,
        }
    }

    /// Get the user configuration file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gateway-deploy").join("config.toml"))
    }

    /// Set environment variable for substitution and overrides
    pub fn set_env_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }

    /// Load the effective configuration for an application directory
    pub fn load(&self, app_dir: &Path, explicit: Option<&Path>) -> Result<DeployConfig> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        if let Some(user_config) = &self.user_config {
            if user_config.exists() {
                info!("Loading user configuration from: {}", user_config.display());
                merge_values(&mut merged, self.read_layer(user_config)?);
            }
        }

        let project_config = app_dir.join(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            info!(
                "Loading project configuration from: {}",
                project_config.display()
            );
            merge_values(&mut merged, self.read_layer(&project_config)?);
        }

        if let Some(path) = explicit {
            info!("Loading configuration from: {}", path.display());
            merge_values(&mut merged, self.read_layer(path)?);
        }

        // Well-formed TOML with the wrong value types surfaces as DeployError::Toml
        let config: DeployConfig = merged.try_into()?;

        let config = self.apply_env_overrides(config)?;
        let config = expand_paths(config);
        config.validate()?;

        debug!("Final configuration: {:#?}", config);
        Ok(config)
    }

    fn read_layer(&self, path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path).map_err(|e| {
            DeployError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        toml::from_str(&expanded).map_err(|e| {
            DeployError::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Expand `${VAR}` references in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| DeployError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(DeployError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Apply `GATEWAY_DEPLOY_*` environment variable overrides
    fn apply_env_overrides(&self, mut config: DeployConfig) -> Result<DeployConfig> {
        if let Some(name) = self.env_vars.get("GATEWAY_DEPLOY_SERVICE") {
            config.service.name = name.clone();
        }

        if let Some(dir) = self.env_vars.get("GATEWAY_DEPLOY_UNIT_DIR") {
            config.service.unit_dir = PathBuf::from(dir);
        }

        if let Some(delay) = self.env_vars.get("GATEWAY_DEPLOY_ACTIVATION_DELAY") {
            config.service.activation_delay_secs = delay.parse().map_err(|_| {
                DeployError::config(format!(
                    "GATEWAY_DEPLOY_ACTIVATION_DELAY must be a number of seconds, got '{}'",
                    delay
                ))
            })?;
        }

        if let Some(interpreter) = self.env_vars.get("GATEWAY_DEPLOY_INTERPRETER") {
            config.runtime.interpreter = interpreter.clone();
        }

        if let Some(url) = self.env_vars.get("GATEWAY_DEPLOY_HEALTH_URL") {
            config.readiness.health_url = url.clone();
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`; tables merge key by key, other values replace
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}

fn expand_paths(mut config: DeployConfig) -> DeployConfig {
    config.paths.venv_dir = expand_tilde(&config.paths.venv_dir);
    config.paths.requirements = expand_tilde(&config.paths.requirements);
    config.paths.env_file = expand_tilde(&config.paths.env_file);
    config.paths.env_template = expand_tilde(&config.paths.env_template);
    config.paths.log_dir = expand_tilde(&config.paths.log_dir);
    config.service.unit_dir = expand_tilde(&config.service.unit_dir);
    config
}
