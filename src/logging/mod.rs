// file: src/logging/mod.rs
// version: 1.0.0
// guid: 5d0b3f61-7a2c-4e08-9f1d-2b6c8e4a7d13

//! Diagnostic logging for gateway-deploy

pub mod logger;

pub use logger::{init_json_logger, init_logger};
