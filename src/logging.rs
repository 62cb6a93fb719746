//! Structured logging system for the network speed tester
//!
//! This module provides:
//! - Structured logging with multiple levels and contexts
//! - Correlation IDs tying every entry of one benchmark run together
//! - JSON structured output in debug mode, stderr-only output for `--json` runs
//! - A pipeline-specific logger for endpoint, probe and transfer events

use crate::error::AppError;
use crate::models::{Config, EndpointDescriptor, LatencyStats, TransferSummary, TransferTiming};
use crate::types::RunState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Per-probe, per-transfer and state-transition detail
    Debug = 0,
    /// Stage results
    Info = 1,
    /// Failed attempts the run survives
    Warn = 2,
    /// Errors that end a run
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",    // Cyan
            LogLevel::Info => "\x1b[32m",     // Green
            LogLevel::Warn => "\x1b[33m",     // Yellow
            LogLevel::Error => "\x1b[31m",    // Red
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Where formatted entries end up
#[derive(Clone)]
enum LogSink {
    /// stderr for warnings and above, stdout otherwise
    Console,
    /// stderr only, keeping stdout free for a machine-readable report
    Stderr,
    /// Kept in memory, used by tests
    Memory(Arc<Mutex<Vec<LogEntry>>>),
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    /// Minimum log level to output
    min_level: LogLevel,
    /// Whether to use colored output
    use_color: bool,
    /// Output format
    format: LogFormat,
    /// Logger name
    name: String,
    /// Output destination
    sink: LogSink,
    /// Correlation ID of the operation in progress
    current_correlation_id: Arc<RwLock<Option<String>>>,
}

impl Logger {
    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            sink: if config.json_output { LogSink::Stderr } else { LogSink::Console },
            current_correlation_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a logger that records every entry in memory.
    ///
    /// Returns the logger and the shared buffer it appends to.
    pub fn capturing(name: String) -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            min_level: LogLevel::Debug,
            use_color: false,
            format: LogFormat::Console,
            name,
            sink: LogSink::Memory(buffer.clone()),
            current_correlation_id: Arc::new(RwLock::new(None)),
        };
        (logger, buffer)
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        *self.current_correlation_id.write().await = Some(correlation_id.clone());

        self.info(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut current = self.current_correlation_id.write().await;
        if current.as_deref() == Some(correlation_id) {
            *current = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    /// Convenience methods for different log levels
    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Write log entry to output
    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if entry.correlation_id.is_none() {
            entry.correlation_id = self.current_correlation_id.read().await.clone();
        }

        let to_stderr = match &self.sink {
            LogSink::Memory(buffer) => {
                if let Ok(mut entries) = buffer.lock() {
                    entries.push(entry);
                }
                return;
            }
            LogSink::Stderr => true,
            LogSink::Console => entry.level >= LogLevel::Warn,
        };

        let output = self.format_entry(&entry);
        if to_stderr {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    /// Format an entry according to the configured format
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}",
            timestamp,
            formatted_level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add transfer timing information
    pub fn timing(self, timing: &TransferTiming) -> Self {
        self.field("direction", timing.direction)
            .field("bytes", timing.bytes_transferred)
            .field("elapsed_s", timing.elapsed_seconds())
            .field("success", timing.is_successful())
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the measurement pipeline stages
#[derive(Clone)]
pub struct BenchmarkLogger {
    logger: Logger,
}

impl BenchmarkLogger {
    /// Create a benchmark logger from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("BENCH".to_string(), config),
        }
    }

    /// Wrap an existing logger
    pub fn with_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// Access the underlying logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Mark the start of a run; returns its correlation ID
    pub async fn start_run(&self) -> String {
        self.logger.start_operation("benchmark run").await
    }

    /// Mark the end of a run
    pub async fn end_run(&self, correlation_id: &str, success: bool) {
        self.logger.end_operation(correlation_id, "benchmark run", success).await;
    }

    /// Log a run state transition
    pub async fn log_state(&self, from: RunState, to: RunState) {
        self.logger.debug(&format!("State {} -> {}", from, to))
            .field("from", from)
            .field("to", to)
            .log()
            .await;
    }

    /// Log the endpoint chosen for the run
    pub async fn log_endpoint_selected(&self, endpoint: &EndpointDescriptor) {
        self.logger.info(&format!("Selected endpoint {} at {}", endpoint, endpoint.host))
            .field("host", &endpoint.host)
            .field("sponsor", &endpoint.sponsor)
            .field("country", &endpoint.country)
            .log()
            .await;
    }

    /// Log a single latency probe
    pub async fn log_probe(&self, sequence: u32, rtt_ms: f64) {
        self.logger.debug(&format!("Probe {} rtt={:.3}ms", sequence, rtt_ms))
            .field("seq", sequence)
            .field("rtt_ms", rtt_ms)
            .log()
            .await;
    }

    /// Log a probe that did not complete
    pub async fn log_probe_failed(&self, sequence: u32, error: &AppError) {
        self.logger.error(&format!("Probe {} failed: {}", sequence, error))
            .field("seq", sequence)
            .error_info(error)
            .log()
            .await;
    }

    /// Log the latency dataset summary
    pub async fn log_latency(&self, stats: &LatencyStats) {
        self.logger.info(&format!(
            "Latency avg={:.2}ms jitter={:.2}ms over {} probes",
            stats.average_ms, stats.jitter_ms, stats.sample_count()
        ))
            .field("average_ms", stats.average_ms)
            .field("jitter_ms", stats.jitter_ms)
            .field("samples", stats.sample_count())
            .log()
            .await;
    }

    /// Log one transfer outcome; failures are warnings
    pub async fn log_transfer(&self, index: usize, timing: &TransferTiming) {
        if timing.is_successful() {
            self.logger.debug(&format!(
                "{} #{} moved {} bytes in {:.3}s",
                timing.direction, index + 1, timing.bytes_transferred, timing.elapsed_seconds()
            ))
                .field("index", index)
                .timing(timing)
                .log()
                .await;
        } else {
            let reason = timing.error_message.as_deref().unwrap_or("unknown error");
            self.logger.warn(&format!(
                "{} #{} failed after {:.3}s: {}",
                timing.direction, index + 1, timing.elapsed_seconds(), reason
            ))
                .field("index", index)
                .field("error", reason)
                .timing(timing)
                .log()
                .await;
        }
    }

    /// Log a direction's aggregate
    pub async fn log_summary(&self, summary: &TransferSummary) {
        self.logger.info(&format!(
            "{} {:.2} Mbps ({}/{} attempts, avg {:.3}s)",
            summary.direction, summary.mbps, summary.succeeded, summary.attempted, summary.average_seconds
        ))
            .field("direction", summary.direction)
            .field("mbps", summary.mbps)
            .field("attempted", summary.attempted)
            .field("succeeded", summary.succeeded)
            .log()
            .await;
    }

    /// Log a fatal run error
    pub async fn log_run_failed(&self, state: RunState, error: &AppError) {
        self.logger.error(&format!("Run failed while {}: {}", state, error))
            .field("state", state)
            .error_info(error)
            .log()
            .await;
    }
}
