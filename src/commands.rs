//! CLI command definitions
//!
//! Defines the clap subcommands for the harness binary.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a server over line-delimited JSON-RPC on its stdio
    Stdio {
        /// Path to the server executable
        program: PathBuf,

        /// Arguments to pass to the server
        #[arg(last = true)]
        args: Vec<String>,

        /// Settling delay before the first request, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,
    },

    /// Validate an already-running server over its HTTP surface
    Http {
        /// Base URL of the server (default: http://localhost:8080)
        #[arg(long)]
        base_url: Option<String>,

        /// Seconds to wait for GET /health to answer
        #[arg(long)]
        ready_secs: Option<u64>,
    },
}
