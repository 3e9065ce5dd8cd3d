// file: src/cli/args.rs
// version: 1.0.0
// guid: 4b9a6d13-0e7f-4c25-b8d1-3f6e2a9c7b04

//! Command line argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gateway-deploy")]
#[command(about = "Deploy the SMS gateway API as a systemd service on this host")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Application directory (contains main.py and requirements.txt)
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Additional configuration file, merged over deploy.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Service name (overrides configuration)
    #[arg(short, long)]
    pub service: Option<String>,

    /// Probe this URL once the service is active
    #[arg(long)]
    pub health_url: Option<String>,

    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,
}
