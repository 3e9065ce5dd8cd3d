// file: src/cli/mod.rs
// version: 1.0.0
// guid: 8e3f1c27-5a4d-4b96-a0e2-7c1d9f3b5a68

//! Command line interface for gateway-deploy

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
