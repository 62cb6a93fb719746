//! Final benchmark report

use crate::models::{EndpointDescriptor, LatencyStats};
use crate::types::TransferDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate of one direction's transfer dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Download or upload
    pub direction: TransferDirection,
    /// Size of one chunk in bytes
    pub chunk_bytes: u64,
    /// Attempts launched
    pub attempted: usize,
    /// Attempts that moved the whole chunk
    pub succeeded: usize,
    /// Mean elapsed seconds over successful attempts
    pub average_seconds: f64,
    /// Throughput in decimal megabits per second, two decimals
    pub mbps: f64,
}

impl TransferSummary {
    /// Attempts excluded from the aggregate
    pub fn failed(&self) -> usize {
        self.attempted.saturating_sub(self.succeeded)
    }
}

/// Terminal, immutable result of one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    endpoint: EndpointDescriptor,
    latency: LatencyStats,
    download: TransferSummary,
    upload: TransferSummary,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl BenchmarkReport {
    /// Assemble a report from the results of every stage
    pub fn new(
        endpoint: EndpointDescriptor,
        latency: LatencyStats,
        download: TransferSummary,
        upload: TransferSummary,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            endpoint,
            latency,
            download,
            upload,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }

    pub fn download_mbps(&self) -> f64 {
        self.download.mbps
    }

    pub fn upload_mbps(&self) -> f64 {
        self.upload.mbps
    }

    pub fn download(&self) -> &TransferSummary {
        &self.download
    }

    pub fn upload(&self) -> &TransferSummary {
        &self.upload
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Total wall-clock time of the run
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}
