//! Core formatting trait and the plain text implementation

use crate::{
    error::{AppError, Result},
    models::{BenchmarkReport, TransferSummary},
};
use std::fmt::Write as _;

/// Renders benchmark results for the terminal
pub trait ReportFormatter {
    /// Format the startup banner
    fn format_banner(&self) -> Result<String>;

    /// Format a complete report
    fn format_report(&self, report: &BenchmarkReport) -> Result<String>;

    /// Format a failed run
    fn format_failure(&self, error: &AppError) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone, Default)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show individual probe samples and run timing
    pub verbose_mode: bool,
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

pub(crate) fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Formatting failed: {}", e))
}

/// `"1 of 4 downloads failed"`, or `None` when nothing failed
pub(crate) fn failure_note(summary: &TransferSummary) -> Option<String> {
    if summary.failed() == 0 {
        return None;
    }
    Some(format!(
        "{} of {} {}s failed",
        summary.failed(),
        summary.attempted,
        summary.direction
    ))
}

impl ReportFormatter for PlainFormatter {
    fn format_banner(&self) -> Result<String> {
        Ok(format!("Network Speed Tester v{}", crate::VERSION))
    }

    fn format_report(&self, report: &BenchmarkReport) -> Result<String> {
        let mut out = String::new();
        let latency = report.latency();

        writeln!(out, "Selected server: {}", report.endpoint()).map_err(fmt_err)?;
        writeln!(out, "Server pinged in {}ms", latency.rounded_average_ms()).map_err(fmt_err)?;
        writeln!(out, "Jitter: {:.2}ms", latency.jitter_ms).map_err(fmt_err)?;

        for (label, summary) in [("Download", report.download()), ("Upload", report.upload())] {
            write!(out, "{} speed : {:.2} Mbps", label, summary.mbps).map_err(fmt_err)?;
            if let Some(note) = failure_note(summary) {
                write!(out, " ({})", note).map_err(fmt_err)?;
            }
            out.push('\n');
        }

        if self.options.verbose_mode {
            let samples: Vec<String> = latency.samples_ms.iter().map(|ms| format!("{:.1}", ms)).collect();
            writeln!(out, "Probe samples (ms): {}", samples.join(", ")).map_err(fmt_err)?;
            writeln!(
                out,
                "Average transfer time: download {:.3}s, upload {:.3}s",
                report.download().average_seconds,
                report.upload().average_seconds
            )
            .map_err(fmt_err)?;
            writeln!(
                out,
                "Completed in {:.1}s",
                report.duration().num_milliseconds() as f64 / 1000.0
            )
            .map_err(fmt_err)?;
        }

        Ok(out)
    }

    fn format_failure(&self, error: &AppError) -> Result<String> {
        Ok(format!("Benchmark failed: {}", error.user_friendly_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;

    #[test]
    fn test_plain_report_lines() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let text = formatter.format_report(&sample_report(0)).unwrap();

        assert!(text.contains("Selected server: X (Ankara, Turkey)"));
        assert!(text.contains("Server pinged in 20ms"));
        assert!(text.contains("Jitter: 1.41ms"));
        assert!(text.contains("Download speed : 320.00 Mbps"));
        assert!(text.contains("Upload speed : 400.00 Mbps"));
        assert!(!text.contains("failed"));
        assert!(!text.contains("Probe samples"));
    }

    #[test]
    fn test_plain_report_notes_failures() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let text = formatter.format_report(&sample_report(1)).unwrap();
        assert!(text.contains("(1 of 4 downloads failed)"));
    }

    #[test]
    fn test_verbose_report_includes_samples() {
        let formatter = PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: true,
        });
        let text = formatter.format_report(&sample_report(0)).unwrap();
        assert!(text.contains("Probe samples (ms): 20.0, 22.0, 19.0, 21.0, 18.0"));
    }

    #[test]
    fn test_failure_message() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let text = formatter
            .format_failure(&AppError::directory_unavailable("no servers"))
            .unwrap();
        assert!(text.starts_with("Benchmark failed:"));
    }
}
