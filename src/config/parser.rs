//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::validation)?;

        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(count) = cli.count {
            config.probe_count = count;
        }
        if let Some(transfers) = cli.transfers {
            config.transfer_count = transfers;
        }
        if let Some(size) = cli.download_size {
            config.download_size_bytes = size;
        }
        if let Some(size) = cli.upload_size {
            config.upload_size_bytes = size;
        }
        if let Some(timeout) = cli.timeout {
            config.request_timeout_seconds = timeout;
        }
        if let Some(ref server) = cli.server {
            config.endpoint_host = Some(server.clone());
        }
        if let Some(ref directory) = cli.directory {
            config.directory_url = directory.clone();
        }

        if cli.no_color || cli.json {
            config.enable_color = false;
        } else if cli.color {
            config.enable_color = true;
        }

        // CLI-only switches
        config.verbose = cli.verbose;
        config.debug = cli.debug;
        config.interactive = cli.interactive;
        config.json_output = cli.json;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: probes={}, transfers={}, timeout={}s, enable_color={}",
                config.probe_count, config.transfer_count, config.request_timeout_seconds, config.enable_color
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    match config.endpoint_host {
        Some(ref host) => summary.push(format!("Server: {} (directory skipped)", host)),
        None => summary.push(format!("Directory: {}", config.directory_url)),
    }
    summary.push(format!(
        "Latency probes: {} every {}ms (timeout {}s)",
        config.probe_count, config.probe_interval_ms, config.probe_timeout_seconds
    ));
    summary.push(format!("Transfers per direction: {}", config.transfer_count));
    summary.push(format!("Download size: {} bytes", config.download_size_bytes));
    summary.push(format!("Upload size: {} bytes", config.upload_size_bytes));
    summary.push(format!("Request timeout: {}s", config.request_timeout_seconds));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
