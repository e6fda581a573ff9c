//! Error types for the conformance harness
//!
//! Only fatal conditions surface as errors: a server that cannot be
//! launched or never becomes reachable. Everything that happens once the
//! run is underway is folded into scenario outcomes instead, so the run
//! always produces a full report.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Process lifecycle ===
    #[error("Failed to spawn server '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("Server never became ready within {0} seconds")]
    ReadinessTimeout(u64),

    #[error("Server process error: {0}")]
    Process(String),

    // === Protocol ===
    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === IO / serialization ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a spawn error for a program that could not be launched
    pub fn spawn(program: &str, reason: impl std::fmt::Display) -> Self {
        Self::Spawn {
            program: program.to_string(),
            reason: reason.to_string(),
        }
    }
}
