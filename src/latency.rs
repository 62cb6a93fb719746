//! Round-trip latency and jitter measurement
//!
//! Probes are blocking, bounded-timeout operations. They are issued one at a
//! time on the blocking thread pool with a fixed delay between them, and the
//! first probe that fails aborts the whole measurement.

use crate::{
    error::{AppError, Result},
    logging::BenchmarkLogger,
    models::{Config, EndpointDescriptor, LatencyStats},
};
use std::{
    net::{Shutdown, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::{Duration, Instant},
};

/// A single echo round trip to a host
pub trait EchoProber: Send + Sync {
    /// Perform one probe and return its round-trip time.
    ///
    /// Blocks the calling thread for at most roughly `timeout`.
    fn probe(&self, host: &str, port: u16, timeout: Duration) -> Result<Duration>;
}

/// Measures the TCP handshake round trip to `host:port`.
///
/// Name resolution happens before the clock starts. Unlike ICMP echo this
/// needs no raw-socket privileges.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpEchoProber;

impl EchoProber for TcpEchoProber {
    fn probe(&self, host: &str, port: u16, timeout: Duration) -> Result<Duration> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| AppError::endpoint_unreachable(format!("cannot resolve {}: {}", host, e)))?
            .next()
            .ok_or_else(|| AppError::endpoint_unreachable(format!("{} has no addresses", host)))?;

        let start = Instant::now();
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                AppError::timeout(format!("no answer from {} within {:?}", addr, timeout))
            } else {
                AppError::endpoint_unreachable(format!("{}: {}", addr, e))
            }
        })?;
        let rtt = start.elapsed();

        let _ = stream.shutdown(Shutdown::Both);
        Ok(rtt)
    }
}

/// Issues a fixed number of spaced probes and derives latency statistics
pub struct LatencyProbe {
    prober: Arc<dyn EchoProber>,
    count: u32,
    interval: Duration,
    timeout: Duration,
    logger: BenchmarkLogger,
}

impl LatencyProbe {
    /// Create a probe stage with explicit parameters
    pub fn new(
        prober: Arc<dyn EchoProber>,
        count: u32,
        interval: Duration,
        timeout: Duration,
        logger: BenchmarkLogger,
    ) -> Self {
        Self { prober, count, interval, timeout, logger }
    }

    /// Create a probe stage from configuration
    pub fn from_config(prober: Arc<dyn EchoProber>, config: &Config, logger: BenchmarkLogger) -> Self {
        Self::new(
            prober,
            config.probe_count,
            config.probe_interval(),
            config.probe_timeout(),
            logger,
        )
    }

    /// Number of probes per measurement
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Probe the endpoint `count` times and compute average and jitter.
    ///
    /// Fails with `EndpointUnreachable` as soon as any probe fails.
    pub async fn measure(&self, endpoint: &EndpointDescriptor) -> Result<LatencyStats> {
        if self.count == 0 {
            return Err(AppError::config("Probe count must be greater than 0"));
        }

        let (host, port) = endpoint
            .probe_target()
            .map_err(|e| AppError::endpoint_unreachable(e.to_string()))?;

        let mut samples = Vec::with_capacity(self.count as usize);

        for sequence in 1..=self.count {
            if sequence > 1 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }

            let prober = self.prober.clone();
            let target = host.clone();
            let timeout = self.timeout;
            let outcome = tokio::task::spawn_blocking(move || prober.probe(&target, port, timeout)).await?;

            match outcome {
                Ok(rtt) => {
                    self.logger.log_probe(sequence, rtt.as_secs_f64() * 1000.0).await;
                    samples.push(rtt);
                }
                Err(e) => {
                    let error = AppError::endpoint_unreachable(format!(
                        "probe {} of {} to {}:{} failed: {}",
                        sequence, self.count, host, port, e
                    ));
                    self.logger.log_probe_failed(sequence, &error).await;
                    return Err(error);
                }
            }
        }

        let stats = LatencyStats::from_durations(&samples)?;
        self.logger.log_latency(&stats).await;
        Ok(stats)
    }
}
