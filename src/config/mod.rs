// file: src/config/mod.rs
// version: 1.0.0
// guid: fd4058d3-1e91-435a-b406-b620143523b7

//! Deployment configuration
//!
//! Handles the layered TOML configuration that tells the pipeline where the
//! application lives, which interpreter to use and how the service is named.

pub mod env_file;
pub mod loader;

pub use env_file::EnvFile;
pub use loader::ConfigLoader;

use crate::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default systemd unit directory
pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";

/// Default service name of the deployed API
pub const DEFAULT_SERVICE_NAME: &str = "sms-gateway";

/// Full deployment configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub runtime: RuntimeConfig,
    pub paths: PathsConfig,
    pub service: ServiceConfig,
    pub execution: ExecutionConfig,
    pub readiness: ReadinessConfig,
}

/// Interpreter and application entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter looked up on PATH
    pub interpreter: String,
    /// Module imported by the smoke test
    pub entry_module: String,
}

/// Paths relative to the application directory (absolute paths are kept as-is)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub venv_dir: PathBuf,
    pub requirements: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unit name without the `.service` suffix
    pub name: String,
    pub unit_dir: PathBuf,
    /// Fixed wait between restart and the single liveness probe
    pub activation_delay_secs: u64,
    /// Prefix privileged commands with sudo when not running as root
    pub use_sudo: bool,
    /// Service group; empty means the invoking user's name
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Health endpoint probed after activation; empty disables the probe
    pub health_url: String,
    pub timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            entry_module: "main".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from("venv"),
            requirements: PathBuf::from("requirements.txt"),
            env_file: PathBuf::from(".env"),
            env_template: PathBuf::from(".env.example"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            unit_dir: PathBuf::from(DEFAULT_UNIT_DIR),
            activation_delay_secs: 3,
            use_sudo: true,
            group: String::new(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 600,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            health_url: String::new(),
            timeout_seconds: 5,
        }
    }
}

impl ServiceConfig {
    /// File name of the unit, e.g. `sms-gateway.service`
    pub fn unit_file_name(&self) -> String {
        format!("{}.service", self.name)
    }

    pub fn activation_delay(&self) -> Duration {
        Duration::from_secs(self.activation_delay_secs)
    }
}

impl ReadinessConfig {
    /// Configured health URL, if the probe is enabled
    pub fn url(&self) -> Option<&str> {
        let url = self.health_url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

impl DeployConfig {
    /// Reject configurations the pipeline cannot act on
    pub fn validate(&self) -> Result<()> {
        let name = self.service.name.trim();
        if name.is_empty() {
            return Err(DeployError::config("service name must not be empty"));
        }
        if name.contains('/') || name.chars().any(char::is_whitespace) {
            return Err(DeployError::config(format!(
                "invalid service name '{}': must not contain '/' or whitespace",
                self.service.name
            )));
        }

        if self.runtime.interpreter.trim().is_empty() {
            return Err(DeployError::config("runtime interpreter must not be empty"));
        }
        if self.runtime.entry_module.trim().is_empty() {
            return Err(DeployError::config("entry module must not be empty"));
        }

        if let Some(health_url) = self.readiness.url() {
            url::Url::parse(health_url).map_err(|e| {
                DeployError::config(format!("invalid health URL '{}': {}", health_url, e))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_layout() {
        let config = DeployConfig::default();
        assert_eq!(config.runtime.interpreter, "python3");
        assert_eq!(config.paths.env_template, PathBuf::from(".env.example"));
        assert_eq!(config.service.unit_file_name(), "sms-gateway.service");
        assert_eq!(config.service.activation_delay(), Duration::from_secs(3));
        assert!(config.readiness.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_service_name() {
        let mut config = DeployConfig::default();
        config.service.name = "../etc/passwd".to_string();
        assert!(config.validate().is_err());

        config.service.name = "  ".to_string();
        assert!(config.validate().is_err());

        config.service.name = "sms gateway".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_health_url() {
        let mut config = DeployConfig::default();
        config.readiness.health_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.readiness.health_url = "http://127.0.0.1:8000/health".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.readiness.url(), Some("http://127.0.0.1:8000/health"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DeployConfig = toml::from_str(
            r#"
[service]
name = "api-gateway"
activation_delay_secs = 0
"#,
        )
        .unwrap();

        assert_eq!(config.service.name, "api-gateway");
        assert_eq!(config.service.activation_delay_secs, 0);
        assert_eq!(config.service.unit_dir, PathBuf::from(DEFAULT_UNIT_DIR));
        assert_eq!(config.paths.venv_dir, PathBuf::from("venv"));
    }
}
