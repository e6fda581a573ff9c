//! gatecheck - conformance harness for permission-gated tool servers
//!
//! Drives a target server over stdio JSON-RPC or JSON-over-HTTP, runs a
//! fixed list of authorization scenarios, and exits 0 iff every scenario
//! matched its expectation.

use clap::Parser;
use std::path::PathBuf;

use gatecheck::commands::Commands;
use gatecheck::common::{config, logging};
use gatecheck::harness;

#[derive(Parser)]
#[command(name = "gatecheck", about = "Conformance harness for permission-gated tool servers")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to an optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Stdio {
            program,
            args,
            settle_ms,
        } => harness::run_stdio(&config, &program, &args, settle_ms).await,
        Commands::Http {
            base_url,
            ready_secs,
        } => harness::run_http(&config, base_url, ready_secs).await,
    };

    match result {
        Ok(report) => std::process::exit(report.exit_code()),
        Err(e) => {
            // Fatal: the server never ran or never became reachable
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
