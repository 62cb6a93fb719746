//! Error handling for the network speed tester

use thiserror::Error;

/// Custom error types for the network speed tester
#[derive(Error, Debug)]
pub enum AppError {
    /// The server directory could not be queried or returned no candidates
    #[error("Server directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The server directory answered with something that is not a server list
    #[error("Server directory response malformed: {0}")]
    DirectoryParse(String),

    /// A latency probe to the selected endpoint did not complete
    #[error("Endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    /// A single download or upload attempt failed
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Every attempt in a dataset failed, so nothing can be aggregated
    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// I/O errors (temporary files, stdin, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, numbers, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new directory unavailable error
    pub fn directory_unavailable<S: Into<String>>(message: S) -> Self {
        Self::DirectoryUnavailable(message.into())
    }

    /// Create a new directory parse error
    pub fn directory_parse<S: Into<String>>(message: S) -> Self {
        Self::DirectoryParse(message.into())
    }

    /// Create a new endpoint unreachable error
    pub fn endpoint_unreachable<S: Into<String>>(message: S) -> Self {
        Self::EndpointUnreachable(message.into())
    }

    /// Create a new transfer failure
    pub fn transfer_failed<S: Into<String>>(message: S) -> Self {
        Self::TransferFailed(message.into())
    }

    /// Create a new insufficient samples error
    pub fn insufficient_samples<S: Into<String>>(message: S) -> Self {
        Self::InsufficientSamples(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable(_) | Self::DirectoryParse(_) => "DIRECTORY",
            Self::EndpointUnreachable(_) => "LATENCY",
            Self::TransferFailed(_) => "TRANSFER",
            Self::InsufficientSamples(_) => "SAMPLES",
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether a malformed or failed directory query caused this error.
    ///
    /// Both directory variants abort a run the same way.
    pub fn is_directory_failure(&self) -> bool {
        matches!(self, Self::DirectoryUnavailable(_) | Self::DirectoryParse(_))
    }

    /// Check if error only affects a single attempt and the run can go on
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TransferFailed(_) | Self::HttpRequest(_) | Self::Timeout(_) => true,
            Self::DirectoryUnavailable(_)
            | Self::DirectoryParse(_)
            | Self::EndpointUnreachable(_)
            | Self::InsufficientSamples(_) => false,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DirectoryUnavailable(msg) | Self::DirectoryParse(msg) => {
                format!("Could not find a test server: {}\n\nSuggestion: Check your internet connection, or pass a server directly with --server host:port.", msg)
            }
            Self::EndpointUnreachable(msg) => {
                format!("The test server did not answer: {}\n\nSuggestion: The server may be down or filtered. Run the test again to pick a server afresh.", msg)
            }
            Self::TransferFailed(msg) => {
                format!("A transfer attempt failed: {}\n\nSuggestion: This attempt was excluded from the averages.", msg)
            }
            Self::InsufficientSamples(msg) => {
                format!("No usable measurements: {}\n\nSuggestion: Every transfer failed. Try a smaller payload with --download-size/--upload-size or a longer --timeout.", msg)
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the format of your server host, URLs and sizes.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The test server may be down or blocking requests.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout value using --timeout or check your network connection.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check that the temporary directory is writable and has free space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::DirectoryUnavailable(_) | Self::DirectoryParse(_) | Self::HttpRequest(_) => 2,
            Self::Timeout(_) => 3,
            Self::EndpointUnreachable(_) => 4,
            Self::Io(_) => 5,
            Self::TransferFailed(_) | Self::InsufficientSamples(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::DirectoryUnavailable(_)
                | Self::DirectoryParse(_)
                | Self::EndpointUnreachable(_)
                | Self::HttpRequest(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::TransferFailed(_) | Self::InsufficientSamples(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::internal(format!("Background task failed: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }

    /// Render the report text without printing it
    pub fn render(&self, error: &AppError) -> String {
        let mut output = error.format_for_console(self.use_color);

        if self.verbose {
            output.push_str("\n\n");
            output.push_str(&error.user_friendly_message());
        }

        output
    }
}
