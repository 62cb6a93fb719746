//! Network Speed Tester
//!
//! Finds a nearby test server, measures round-trip latency and jitter to it,
//! then estimates download and upload throughput from concurrent timed bulk
//! transfers.

pub mod app;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod latency;
pub mod logging;
pub mod models;
pub mod output;
pub mod session;
pub mod stats;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use app::{RunTracker, SpeedTest};
pub use directory::{EndpointDirectory, HttpEndpointDirectory, StaticEndpointDirectory};
pub use error::{AppError, Result};
pub use latency::{EchoProber, LatencyProbe, TcpEchoProber};
pub use models::{BenchmarkReport, Config, EndpointDescriptor, LatencyStats, TransferSummary, TransferTiming};
pub use stats::ResultAggregator;
pub use session::{Session, SessionEvent, SessionState};
pub use transfer::{TransferBenchmark, TransferRunner, TransferSettings};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata recorded by the build script
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// One-line build description for debug output
pub fn build_info() -> String {
    match GIT_COMMIT {
        Some(commit) => format!("{} v{} ({}, {}, built {})", PKG_NAME, VERSION, commit, TARGET_TRIPLE, BUILD_TIME),
        None => format!("{} v{} ({}, built {})", PKG_NAME, VERSION, TARGET_TRIPLE, BUILD_TIME),
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_DIRECTORY_URL: &str = "http://www.speedtest.net/api/js/servers?engine=js";
    pub const DEFAULT_PROBE_COUNT: u32 = 5;
    pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(100);
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_TRANSFER_COUNT: u32 = 4;
    pub const DEFAULT_DOWNLOAD_SIZE_BYTES: u64 = 25 * 1000 * 1000;
    pub const DEFAULT_UPLOAD_SIZE_BYTES: u64 = 4 * 1000 * 1000;
    pub const DEFAULT_DOWNLOAD_BLOCK_BYTES: usize = 512 * 1024;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const USER_AGENT: &str = concat!("network-speed-tester/", env!("CARGO_PKG_VERSION"));
}
