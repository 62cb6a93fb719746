//! Colored formatter implementation with terminal color support

use super::formatter::{failure_note, fmt_err, FormattingOptions, PlainFormatter, ReportFormatter};
use crate::{
    error::{AppError, Result},
    models::{BenchmarkReport, TransferSummary},
};
use colored::*;
use std::fmt::Write as _;

/// Quality classification used for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl SpeedLevel {
    /// Classify a throughput figure in Mbps
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps >= 500.0 {
            Self::Excellent
        } else if mbps >= 100.0 {
            Self::Good
        } else if mbps >= 25.0 {
            Self::Fair
        } else if mbps >= 5.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Classify a round-trip time in milliseconds
    pub fn from_latency_ms(ms: f64) -> Self {
        if ms < 20.0 {
            Self::Excellent
        } else if ms < 50.0 {
            Self::Good
        } else if ms < 100.0 {
            Self::Fair
        } else if ms < 300.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Get color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }

    /// Get descriptive text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain: PlainFormatter,
    options: FormattingOptions,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            plain: PlainFormatter::new(options.clone()),
            options,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn label(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn speed_line(&self, out: &mut String, label: &str, summary: &TransferSummary) -> Result<()> {
        let level = SpeedLevel::from_mbps(summary.mbps);
        write!(
            out,
            "{} {} {}",
            self.label(&format!("{} speed :", label)),
            self.colorize(&format!("{:.2} Mbps", summary.mbps), level.color()),
            self.colorize(&format!("[{}]", level.description()), Color::BrightBlack),
        )
        .map_err(fmt_err)?;

        if let Some(note) = failure_note(summary) {
            write!(out, " {}", self.colorize(&format!("({})", note), Color::Yellow)).map_err(fmt_err)?;
        }
        out.push('\n');
        Ok(())
    }
}

impl ReportFormatter for ColoredFormatter {
    fn format_banner(&self) -> Result<String> {
        let banner = self.plain.format_banner()?;
        if self.options.enable_color {
            Ok(banner.blue().bold().to_string())
        } else {
            Ok(banner)
        }
    }

    fn format_report(&self, report: &BenchmarkReport) -> Result<String> {
        let mut out = String::new();
        let latency = report.latency();
        let latency_level = SpeedLevel::from_latency_ms(latency.average_ms);

        writeln!(
            out,
            "{} {}",
            self.label("Selected server:"),
            self.colorize(&report.endpoint().to_string(), Color::Cyan)
        )
        .map_err(fmt_err)?;
        writeln!(
            out,
            "{} {}",
            self.label("Server pinged in"),
            self.colorize(&format!("{}ms", latency.rounded_average_ms()), latency_level.color())
        )
        .map_err(fmt_err)?;
        writeln!(out, "{} {:.2}ms", self.label("Jitter:"), latency.jitter_ms).map_err(fmt_err)?;

        self.speed_line(&mut out, "Download", report.download())?;
        self.speed_line(&mut out, "Upload", report.upload())?;

        if self.options.verbose_mode {
            let samples: Vec<String> = latency.samples_ms.iter().map(|ms| format!("{:.1}", ms)).collect();
            writeln!(
                out,
                "{}",
                self.colorize(&format!("Probe samples (ms): {}", samples.join(", ")), Color::BrightBlack)
            )
            .map_err(fmt_err)?;
            writeln!(
                out,
                "{}",
                self.colorize(
                    &format!(
                        "Completed in {:.1}s",
                        report.duration().num_milliseconds() as f64 / 1000.0
                    ),
                    Color::BrightBlack
                )
            )
            .map_err(fmt_err)?;
        }

        Ok(out)
    }

    fn format_failure(&self, error: &AppError) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.colorize("Benchmark failed:", Color::Red),
            error.user_friendly_message()
        ))
    }
}
