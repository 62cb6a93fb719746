//! Latency and transfer timing data models

use crate::error::{AppError, Result};
use crate::stats;
use crate::types::{TransferDirection, TransferStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Average round-trip time and jitter derived from a latency dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Mean round-trip time in milliseconds
    pub average_ms: f64,

    /// Population standard deviation of the samples in milliseconds
    pub jitter_ms: f64,

    /// The samples the figures were computed from, in probe order
    pub samples_ms: Vec<f64>,
}

impl LatencyStats {
    /// Compute stats from an ordered set of round-trip samples
    pub fn from_samples(samples_ms: &[f64]) -> Result<Self> {
        let average_ms = stats::mean(samples_ms)
            .ok_or_else(|| AppError::insufficient_samples("No latency samples were collected"))?;

        Ok(Self {
            average_ms,
            jitter_ms: stats::population_std_dev(samples_ms),
            samples_ms: samples_ms.to_vec(),
        })
    }

    /// Build stats from probe durations
    pub fn from_durations(samples: &[Duration]) -> Result<Self> {
        let samples_ms: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        Self::from_samples(&samples_ms)
    }

    /// Number of samples in the dataset
    pub fn sample_count(&self) -> usize {
        self.samples_ms.len()
    }

    /// Average rounded to whole milliseconds, as shown to users
    pub fn rounded_average_ms(&self) -> u64 {
        self.average_ms.round().max(0.0) as u64
    }
}

/// Timing of one completed (or failed) transfer attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTiming {
    /// Download or upload
    pub direction: TransferDirection,

    /// Payload bytes actually moved; zero for failed attempts
    pub bytes_transferred: u64,

    /// Wall-clock time from request start to last byte
    pub elapsed: Duration,

    /// Whether the attempt counts towards the aggregate
    pub status: TransferStatus,

    /// When the attempt started
    pub started_at: DateTime<Utc>,

    /// Failure reason, if any
    pub error_message: Option<String>,
}

impl TransferTiming {
    /// A completed transfer
    pub fn success(direction: TransferDirection, bytes_transferred: u64, elapsed: Duration) -> Self {
        Self {
            direction,
            bytes_transferred,
            elapsed,
            status: TransferStatus::Success,
            started_at: Utc::now() - chrono::Duration::from_std(elapsed).unwrap_or_default(),
            error_message: None,
        }
    }

    /// A failed transfer, recorded with zero bytes
    pub fn failed(direction: TransferDirection, elapsed: Duration, error_message: String) -> Self {
        Self {
            direction,
            bytes_transferred: 0,
            elapsed,
            status: TransferStatus::Failed,
            started_at: Utc::now() - chrono::Duration::from_std(elapsed).unwrap_or_default(),
            error_message: Some(error_message),
        }
    }

    /// Check if this attempt succeeded
    pub fn is_successful(&self) -> bool {
        self.status == TransferStatus::Success
    }

    /// Elapsed time as fractional seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}
