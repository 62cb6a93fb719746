//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Direction of a bulk transfer relative to this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Payload flows from the endpoint to us
    Download,
    /// Payload flows from us to the endpoint
    Upload,
}

impl TransferDirection {
    /// Lowercase name, also used as the endpoint path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// The whole payload moved and the server answered with success
    Success,
    /// Network error, bad status or partial payload
    Failed,
}

/// Stages of a single benchmark run.
///
/// A run moves strictly forward; `Failed` is reachable from every
/// non-terminal state and nothing is ever re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    SelectingEndpoint,
    ProbingLatency,
    BenchmarkingDownload,
    BenchmarkingUpload,
    Reporting,
    Done,
    Failed,
}

impl RunState {
    /// Whether the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state that follows this one on the success path
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SelectingEndpoint),
            Self::SelectingEndpoint => Some(Self::ProbingLatency),
            Self::ProbingLatency => Some(Self::BenchmarkingDownload),
            Self::BenchmarkingDownload => Some(Self::BenchmarkingUpload),
            Self::BenchmarkingUpload => Some(Self::Reporting),
            Self::Reporting => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Check whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || self.successor() == Some(next)
    }

    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SelectingEndpoint => "selecting endpoint",
            Self::ProbingLatency => "probing latency",
            Self::BenchmarkingDownload => "benchmarking download",
            Self::BenchmarkingUpload => "benchmarking upload",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
