// file: src/lib.rs
// version: 1.0.0
// guid: 6f2d8b40-9c1e-4a73-b5f6-1e8a3c7d9b22

//! # gateway-deploy
//!
//! Provisions the SMS gateway API on a Linux host: checks the interpreter,
//! builds an isolated environment, installs dependencies, writes the runtime
//! configuration with a fresh API key, and installs and starts the systemd
//! service. Stages run in a fixed order and the run stops at the first
//! failure; rerunning skips whatever is already in place.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod readiness;
pub mod reporter;
pub mod runner;
pub mod secret;
pub mod steps;

pub use error::{DeployError, Result};

/// Version information for the tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
