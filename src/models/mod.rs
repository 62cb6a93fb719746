//! Data models and structures for the network speed tester

pub mod config;
pub mod endpoint;
pub mod metrics;
pub mod report;

// Re-export main model types
pub use config::Config;
pub use endpoint::EndpointDescriptor;
pub use metrics::{LatencyStats, TransferTiming};
pub use report::{BenchmarkReport, TransferSummary};
