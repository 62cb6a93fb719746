//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server directory queried for a measurement endpoint
    #[serde(default = "default_directory_url")]
    pub directory_url: String,

    /// Fixed `host[:port]` that bypasses the directory when set
    #[serde(default)]
    pub endpoint_host: Option<String>,

    /// Number of latency probes per run
    #[serde(default = "default_probe_count")]
    pub probe_count: u32,

    /// Delay between consecutive latency probes
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Timeout of a single latency probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_seconds: u64,

    /// Concurrent transfers per direction
    #[serde(default = "default_transfer_count")]
    pub transfer_count: u32,

    /// Size of one download chunk in bytes
    #[serde(default = "default_download_size")]
    pub download_size_bytes: u64,

    /// Size of one upload chunk in bytes
    #[serde(default = "default_upload_size")]
    pub upload_size_bytes: u64,

    /// Write block size used when spooling downloads to disk
    #[serde(default = "default_download_block")]
    pub download_block_bytes: usize,

    /// Timeout of a single HTTP request (directory, download or upload)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_seconds: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Loop on keypresses instead of running once
    #[serde(default)]
    pub interactive: bool,

    /// Print the report as JSON
    #[serde(default)]
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_url: default_directory_url(),
            endpoint_host: None,
            probe_count: default_probe_count(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_seconds: default_probe_timeout_secs(),
            transfer_count: default_transfer_count(),
            download_size_bytes: default_download_size(),
            upload_size_bytes: default_upload_size(),
            download_block_bytes: default_download_block(),
            request_timeout_seconds: default_request_timeout_secs(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            interactive: false,
            json_output: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Inter-probe delay as Duration
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        match url::Url::parse(&self.directory_url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Directory URL must use http or https: {}",
                        self.directory_url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid directory URL '{}': {}",
                    self.directory_url, e
                )));
            }
        }

        if let Some(ref host) = self.endpoint_host {
            crate::models::EndpointDescriptor::from_host(host.as_str())
                .map_err(|e| AppError::config(format!("Invalid server override: {}", e)))?;
        }

        if self.probe_count == 0 || self.probe_count > 100 {
            return Err(AppError::config("Probe count must be between 1 and 100"));
        }

        if self.probe_interval_ms > 10_000 {
            return Err(AppError::config("Probe interval cannot exceed 10000 ms"));
        }

        if self.probe_timeout_seconds == 0 || self.probe_timeout_seconds > 300 {
            return Err(AppError::config("Probe timeout must be between 1 and 300 seconds"));
        }

        if self.transfer_count == 0 || self.transfer_count > MAX_TRANSFER_COUNT {
            return Err(AppError::config(format!(
                "Transfer count must be between 1 and {}",
                MAX_TRANSFER_COUNT
            )));
        }

        for (label, size) in [
            ("Download size", self.download_size_bytes),
            ("Upload size", self.upload_size_bytes),
        ] {
            if size == 0 {
                return Err(AppError::config(format!("{} must be greater than 0", label)));
            }
            if size > MAX_CHUNK_BYTES {
                return Err(AppError::config(format!(
                    "{} cannot exceed {} bytes",
                    label, MAX_CHUNK_BYTES
                )));
            }
        }

        if self.download_block_bytes < MIN_BLOCK_BYTES || self.download_block_bytes > MAX_BLOCK_BYTES {
            return Err(AppError::config(format!(
                "Download block size must be between {} and {} bytes",
                MIN_BLOCK_BYTES, MAX_BLOCK_BYTES
            )));
        }

        if self.request_timeout_seconds == 0 || self.request_timeout_seconds > 300 {
            return Err(AppError::config("Request timeout must be between 1 and 300 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DIRECTORY_URL") {
            self.directory_url = url.trim().to_string();
        }

        if let Ok(host) = std::env::var("ENDPOINT_HOST") {
            let host = host.trim();
            self.endpoint_host = if host.is_empty() { None } else { Some(host.to_string()) };
        }

        if let Ok(value) = std::env::var("PROBE_COUNT") {
            self.probe_count = parse_env("PROBE_COUNT", &value)?;
        }

        if let Ok(value) = std::env::var("PROBE_INTERVAL_MS") {
            self.probe_interval_ms = parse_env("PROBE_INTERVAL_MS", &value)?;
        }

        if let Ok(value) = std::env::var("PROBE_TIMEOUT_SECONDS") {
            self.probe_timeout_seconds = parse_env("PROBE_TIMEOUT_SECONDS", &value)?;
        }

        if let Ok(value) = std::env::var("TRANSFER_COUNT") {
            self.transfer_count = parse_env("TRANSFER_COUNT", &value)?;
        }

        if let Ok(value) = std::env::var("DOWNLOAD_SIZE_BYTES") {
            self.download_size_bytes = parse_env("DOWNLOAD_SIZE_BYTES", &value)?;
        }

        if let Ok(value) = std::env::var("UPLOAD_SIZE_BYTES") {
            self.upload_size_bytes = parse_env("UPLOAD_SIZE_BYTES", &value)?;
        }

        if let Ok(value) = std::env::var("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = parse_env("REQUEST_TIMEOUT_SECONDS", &value)?;
        }

        if let Ok(value) = std::env::var("ENABLE_COLOR") {
            self.enable_color = parse_env("ENABLE_COLOR", &value)?;
        }

        Ok(())
    }
}

/// Upper bound for concurrent transfers per direction
pub const MAX_TRANSFER_COUNT: u32 = 32;

/// Upper bound for a single chunk (1 GB)
pub const MAX_CHUNK_BYTES: u64 = 1_000_000_000;

/// Smallest accepted download write block
pub const MIN_BLOCK_BYTES: usize = 4 * 1024;

/// Largest accepted download write block
pub const MAX_BLOCK_BYTES: usize = 16 * 1024 * 1024;

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_directory_url() -> String {
    crate::defaults::DEFAULT_DIRECTORY_URL.to_string()
}

fn default_probe_count() -> u32 {
    crate::defaults::DEFAULT_PROBE_COUNT
}

fn default_probe_interval_ms() -> u64 {
    crate::defaults::DEFAULT_PROBE_INTERVAL.as_millis() as u64
}

fn default_probe_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_transfer_count() -> u32 {
    crate::defaults::DEFAULT_TRANSFER_COUNT
}

fn default_download_size() -> u64 {
    crate::defaults::DEFAULT_DOWNLOAD_SIZE_BYTES
}

fn default_upload_size() -> u64 {
    crate::defaults::DEFAULT_UPLOAD_SIZE_BYTES
}

fn default_download_block() -> usize {
    crate::defaults::DEFAULT_DOWNLOAD_BLOCK_BYTES
}

fn default_request_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
