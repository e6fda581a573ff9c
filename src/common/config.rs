//! Configuration file handling
//!
//! All settings are optional; a missing file yields the defaults. The path
//! comes from `--config` or the `GATECHECK_CONFIG` environment variable.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Settling delay before the first stdio request, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Seconds to wait for the HTTP health endpoint
    #[serde(default = "default_ready_secs")]
    pub ready_secs: u64,

    /// Per-request timeout in seconds, on both transports
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            ready_secs: default_ready_secs(),
            request_secs: default_request_secs(),
        }
    }
}

fn default_settle_ms() -> u64 {
    500
}
fn default_ready_secs() -> u64 {
    10
}
fn default_request_secs() -> u64 {
    15
}

/// HTTP transport settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Default base URL when `--base-url` is not given
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Load configuration from an explicit path, `GATECHECK_CONFIG`, or defaults
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match std::env::var_os("GATECHECK_CONFIG") {
            Some(v) => PathBuf::from(v),
            None => return Ok(Config::default()),
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeouts.settle_ms, 500);
        assert_eq!(config.timeouts.ready_secs, 10);
        assert_eq!(config.timeouts.request_secs, 15);
        assert_eq!(config.http.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[timeouts]
settle_ms = 50

[http]
base_url = "http://127.0.0.1:9999"
"#,
        )
        .unwrap();

        assert_eq!(config.timeouts.settle_ms, 50);
        assert_eq!(config.timeouts.request_secs, 15);
        assert_eq!(config.http.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.timeouts.ready_secs, 10);
    }
}
