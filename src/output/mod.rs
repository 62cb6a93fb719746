//! Output formatting and display system
//!
//! Renders a finished benchmark either as human readable text, with or
//! without color, or as JSON for scripts.

mod colored;
mod formatter;

pub use self::colored::{ColoredFormatter, SpeedLevel};
pub use formatter::{FormattingOptions, PlainFormatter, ReportFormatter};

use crate::{
    error::{AppError, Result},
    models::BenchmarkReport,
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn ReportFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a formatter from the loaded configuration
    pub fn from_config(config: &crate::models::Config) -> Box<dyn ReportFormatter> {
        Self::create_formatter(config.enable_color, config.verbose)
    }
}

/// Serialize a report as pretty-printed JSON
pub fn format_report_json(report: &BenchmarkReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| AppError::internal(format!("Failed to serialize report: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{EndpointDescriptor, LatencyStats, TransferSummary};
    use crate::types::TransferDirection;
    use chrono::Utc;

    /// A report matching the reference scenario, with `failed_downloads` of
    /// the four downloads marked as failed
    pub(crate) fn sample_report(failed_downloads: usize) -> BenchmarkReport {
        let endpoint: EndpointDescriptor = serde_json::from_str(
            r#"{"sponsor":"X","name":"Ankara","country":"Turkey","url":"http://h.example:8080/speedtest/upload.php","host":"h.example:8080"}"#,
        )
        .unwrap();
        let latency = LatencyStats::from_samples(&[20.0, 22.0, 19.0, 21.0, 18.0]).unwrap();
        let download = TransferSummary {
            direction: TransferDirection::Download,
            chunk_bytes: 100_000_000,
            attempted: 4,
            succeeded: 4 - failed_downloads,
            average_seconds: 2.5,
            mbps: 320.0,
        };
        let upload = TransferSummary {
            direction: TransferDirection::Upload,
            chunk_bytes: 100_000_000,
            attempted: 4,
            succeeded: 4,
            average_seconds: 2.0,
            mbps: 400.0,
        };
        BenchmarkReport::new(endpoint, latency, download, upload, Utc::now())
    }

    #[test]
    fn test_factory_picks_formatter() {
        let plain = OutputFormatterFactory::create_formatter(false, false);
        let text = plain.format_report(&sample_report(0)).unwrap();
        assert!(text.contains("Download speed : 320.00 Mbps"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn test_json_report() {
        let json = format_report_json(&sample_report(0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["endpoint"]["sponsor"], "X");
        assert_eq!(value["download"]["mbps"], 320.0);
        assert_eq!(value["upload"]["direction"], "upload");
        assert_eq!(value["latency"]["samples_ms"].as_array().unwrap().len(), 5);
        assert!(value["started_at"].is_string());
    }
}
