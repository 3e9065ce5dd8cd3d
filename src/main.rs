// file: src/main.rs
// version: 1.0.0
// guid: c3e7a1d5-2f8b-4d60-a94c-5b0e7f1d3a86

//! gateway-deploy - main entry point

use clap::Parser;
use gateway_deploy::{
    cli::{args::Cli, commands::deploy_command},
    logging::logger,
    pipeline::EXIT_FAILURE,
};
use tokio::signal;
use tracing::{error, warn};

/// Standard exit code for Ctrl+C
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        logger::init_json_logger(cli.verbose, cli.quiet)
    } else {
        logger::init_logger(cli.verbose, cli.quiet)
    };
    if let Err(e) = logging {
        eprintln!("{}", e);
    }

    let code = tokio::select! {
        result = deploy_command(&cli) => match result {
            Ok(code) => code,
            Err(e) => {
                error!("{}", e);
                eprintln!("Error: {}", e);
                EXIT_FAILURE
            }
        },
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping deployment");
            eprintln!("Deployment interrupted; completed stages are left in place");
            EXIT_INTERRUPTED
        }
    };

    std::process::exit(code);
}
