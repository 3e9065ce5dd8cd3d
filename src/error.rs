// file: src/error.rs
// version: 1.0.0
// guid: 77ed8e54-0358-418c-b763-6c491ee1a4bf

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, DeployError>;

/// Error types for the deployment pipeline
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Command '{command}' failed (exit code {exit_code:?}): {stderr}")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Readiness check failed: {0}")]
    Readiness(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeployError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new missing prerequisite error
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingPrerequisite(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a new readiness error
    pub fn readiness(msg: impl Into<String>) -> Self {
        Self::Readiness(msg.into())
    }

    /// Exit code of the failed external command, if this error came from one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Process { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}
