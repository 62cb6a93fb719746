//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# Network Speed Tester Configuration\n\
             #\n\
             # Values here are used as defaults and can be overridden by\n\
             # environment variables and command-line arguments.\n\n",
        );

        for (name, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, name, example));
        }

        content.push_str(
            "# Quick test against a known server with small payloads:\n\
             # ENDPOINT_HOST=speedtest.example.net:8080\n\
             # DOWNLOAD_SIZE_BYTES=5000000\n\
             # UPLOAD_SIZE_BYTES=1000000\n",
        );
        content
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "DIRECTORY_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid DIRECTORY_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("DIRECTORY_URL must use http or https: {}", value)));
                }
            }
            "ENDPOINT_HOST" => {
                if !value.is_empty() {
                    crate::models::EndpointDescriptor::from_host(value)
                        .map_err(|e| AppError::config(format!("Invalid ENDPOINT_HOST '{}': {}", value, e)))?;
                }
            }
            "PROBE_COUNT" => Self::check_range::<u32>(key, value, 1, 100)?,
            "PROBE_INTERVAL_MS" => Self::check_range::<u64>(key, value, 0, 10_000)?,
            "PROBE_TIMEOUT_SECONDS" | "REQUEST_TIMEOUT_SECONDS" => Self::check_range::<u64>(key, value, 1, 300)?,
            "TRANSFER_COUNT" => Self::check_range::<u32>(key, value, 1, 32)?,
            "DOWNLOAD_SIZE_BYTES" | "UPLOAD_SIZE_BYTES" => {
                Self::check_range::<u64>(key, value, 1, crate::models::config::MAX_CHUNK_BYTES)?
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    fn check_range<T>(key: &str, value: &str, min: T, max: T) -> Result<()>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let parsed: T = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("DIRECTORY_URL", "Server directory returning a JSON list of test servers", "http://www.speedtest.net/api/js/servers?engine=js"),
            ("ENDPOINT_HOST", "Fixed test server host[:port], skips the directory", "speedtest.example.net:8080"),
            ("PROBE_COUNT", "Number of latency probes (1-100)", "5"),
            ("PROBE_INTERVAL_MS", "Delay between probes in milliseconds (0-10000)", "100"),
            ("PROBE_TIMEOUT_SECONDS", "Timeout of a single probe (1-300)", "5"),
            ("TRANSFER_COUNT", "Concurrent transfers per direction (1-32)", "4"),
            ("DOWNLOAD_SIZE_BYTES", "Bytes requested per download", "25000000"),
            ("UPLOAD_SIZE_BYTES", "Bytes sent per upload", "4000000"),
            ("REQUEST_TIMEOUT_SECONDS", "Timeout of a single HTTP request (1-300)", "60"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate the entries of an env file, returning one warning per bad line
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value)
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}
