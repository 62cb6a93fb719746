//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Network Speed Tester - measures latency, jitter and throughput to a nearby test server
#[derive(Parser, Debug, Clone)]
#[command(name = "nst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of latency probes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub count: Option<u32>,

    /// Concurrent transfers per direction
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=32))]
    pub transfers: Option<u32>,

    /// Bytes requested per download
    #[arg(long, value_name = "BYTES", value_parser = parse_size)]
    pub download_size: Option<u64>,

    /// Bytes sent per upload
    #[arg(long, value_name = "BYTES", value_parser = parse_size)]
    pub upload_size: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Test against this host[:port] instead of asking the server directory
    #[arg(long, value_name = "HOST")]
    pub server: Option<String>,

    /// Server directory URL
    #[arg(long, value_name = "URL")]
    pub directory: Option<String>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Wait for Enter before each run and offer to run again
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Describe the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,

    /// Check the .env file in the working directory and exit
    #[arg(long)]
    pub check_env: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.json && self.interactive {
            return Err("--json cannot be combined with --interactive".to_string());
        }

        if let Some(server) = &self.server {
            if server.trim().is_empty() || server.contains('/') {
                return Err(format!("Invalid --server '{}': expected host[:port]", server));
            }
        }

        Ok(())
    }

    /// Whether a `.env` maintenance flag replaces the speed test
    pub fn is_env_command(&self) -> bool {
        self.env_help || self.write_env_example.is_some() || self.check_env
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a byte count, accepting `k`/`m`/`g` decimal suffixes
fn parse_size(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let (digits, multiplier) = match trimmed.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('k') => (&trimmed[..trimmed.len() - 1], 1_000),
        Some('m') => (&trimmed[..trimmed.len() - 1], 1_000_000),
        Some('g') => (&trimmed[..trimmed.len() - 1], 1_000_000_000),
        _ => (trimmed, 1),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid size: {}", s))?;

    match value.checked_mul(multiplier) {
        Some(0) => Err("Size must be greater than 0".to_string()),
        Some(bytes) => Ok(bytes),
        None => Err(format!("Size too large: {}", s)),
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["nst", "--count", "7", "-n", "2", "--timeout", "10"]);
        assert_eq!(cli.count, Some(7));
        assert_eq!(cli.transfers, Some(2));
        assert_eq!(cli.timeout, Some(10));
        assert!(!cli.interactive);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        let cli = Cli::parse_from(["nst"]);
        assert!(cli.count.is_none());
        assert!(cli.server.is_none());
        assert!(cli.directory.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "nst",
            "--download-size", "10m",
            "--upload-size", "500k",
            "--server", "h.example:8080",
            "--directory", "http://dir.example/servers",
            "--no-color",
            "--verbose",
            "--debug",
            "-i",
        ]);

        assert_eq!(cli.download_size, Some(10_000_000));
        assert_eq!(cli.upload_size, Some(500_000));
        assert_eq!(cli.server.as_deref(), Some("h.example:8080"));
        assert_eq!(cli.directory.as_deref(), Some("http://dir.example/servers"));
        assert!(cli.no_color && cli.verbose && cli.debug && cli.interactive);
    }

    #[test]
    fn test_out_of_range_counts_rejected() {
        assert!(Cli::try_parse_from(["nst", "--count", "0"]).is_err());
        assert!(Cli::try_parse_from(["nst", "--transfers", "33"]).is_err());
    }

    #[test]
    fn test_validate_conflicts() {
        let both = Cli::parse_from(["nst", "--color", "--no-color"]);
        assert!(both.validate().unwrap_err().contains("--color"));

        let json_interactive = Cli::parse_from(["nst", "--json", "--interactive"]);
        assert!(json_interactive.validate().is_err());

        let bad_server = Cli::parse_from(["nst", "--server", "http://h.example/"]);
        assert!(bad_server.validate().is_err());
    }

    #[test]
    fn test_env_commands() {
        assert!(!Cli::parse_from(["nst"]).is_env_command());
        assert!(Cli::parse_from(["nst", "--env-help"]).is_env_command());
        assert!(Cli::parse_from(["nst", "--check-env"]).is_env_command());

        let cli = Cli::parse_from(["nst", "--write-env-example", "sample.env"]);
        assert!(cli.is_env_command());
        assert_eq!(cli.write_env_example, Some(PathBuf::from("sample.env")));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("1").unwrap(), 1);
        assert_eq!(parse_duration("300").unwrap(), 300);
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("301").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!(parse_size("4000000").unwrap(), 4_000_000);
        assert_eq!(parse_size("25M").unwrap(), 25_000_000);
        assert_eq!(parse_size("1g").unwrap(), 1_000_000_000);
        assert!(parse_size("0").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("99999999999999999999g").is_err());
    }

    #[test]
    fn test_use_colors_flags() {
        assert!(!Cli::parse_from(["nst", "--no-color"]).use_colors());
        assert!(Cli::parse_from(["nst", "--color"]).use_colors());
        assert!(!Cli::parse_from(["nst", "--json"]).use_colors());
    }
}
