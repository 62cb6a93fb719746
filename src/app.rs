//! Benchmark pipeline orchestration
//!
//! A run walks the stages in a fixed order: endpoint selection, latency
//! probing, the download phase, the upload phase and report assembly. Any
//! fatal error stops the run and no report is produced.

use crate::{
    directory::{EndpointDirectory, HttpEndpointDirectory, StaticEndpointDirectory},
    error::{AppError, Result},
    latency::{LatencyProbe, TcpEchoProber},
    logging::BenchmarkLogger,
    models::{BenchmarkReport, Config, EndpointDescriptor, TransferSummary},
    stats::ResultAggregator,
    transfer::{TransferBenchmark, TransferRunner, TransferSettings},
    types::{RunState, TransferDirection},
};
use chrono::Utc;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Records the states a run passes through and rejects illegal moves
#[derive(Debug, Clone)]
pub struct RunTracker {
    history: Vec<RunState>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self { history: vec![RunState::Idle] }
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Idle)
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Move to `next`, returning the state that was left
    pub fn advance(&mut self, next: RunState) -> Result<RunState> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(AppError::internal(format!(
                "illegal run state transition {} -> {}",
                current, next
            )));
        }
        self.history.push(next);
        Ok(current)
    }

    /// Mark the run failed, returning the state it failed in
    pub fn fail(&mut self) -> RunState {
        let current = self.state();
        if !current.is_terminal() {
            self.history.push(RunState::Failed);
        }
        current
    }
}

/// The measurement pipeline
pub struct SpeedTest {
    directory: Arc<dyn EndpointDirectory>,
    latency: LatencyProbe,
    transfers: Arc<dyn TransferRunner>,
    logger: BenchmarkLogger,
    deadline: Option<Duration>,
    last_history: Mutex<Vec<RunState>>,
}

impl SpeedTest {
    /// Assemble a pipeline from its stages
    pub fn new(
        directory: Arc<dyn EndpointDirectory>,
        latency: LatencyProbe,
        transfers: Arc<dyn TransferRunner>,
        logger: BenchmarkLogger,
    ) -> Self {
        Self {
            directory,
            latency,
            transfers,
            logger,
            deadline: None,
            last_history: Mutex::new(Vec::new()),
        }
    }

    /// Build the production pipeline described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let logger = BenchmarkLogger::new(config);

        let directory: Arc<dyn EndpointDirectory> = match &config.endpoint_host {
            Some(host) => Arc::new(StaticEndpointDirectory::from_host(host)?),
            None => Arc::new(HttpEndpointDirectory::new(
                config.directory_url.clone(),
                config.request_timeout(),
            )?),
        };

        let latency = LatencyProbe::from_config(Arc::new(TcpEchoProber), config, logger.clone());
        let transfers = TransferBenchmark::new(TransferSettings::from(config), logger.clone())?;

        Ok(Self::new(directory, latency, Arc::new(transfers), logger))
    }

    /// Bound the wall-clock time of a whole run
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// States visited by the most recent run
    pub fn last_run_history(&self) -> Vec<RunState> {
        self.last_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Run the full pipeline once.
    ///
    /// Each call is independent; nothing is carried over between runs.
    pub async fn run_benchmark(&self) -> Result<BenchmarkReport> {
        let correlation_id = self.logger.start_run().await;
        let mut tracker = RunTracker::new();

        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.execute(&mut tracker))
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::timeout(format!(
                        "benchmark did not finish within {:?}",
                        deadline
                    )))
                }),
            None => self.execute(&mut tracker).await,
        };

        if let Err(e) = &outcome {
            let failed_in = tracker.fail();
            self.logger.log_state(failed_in, RunState::Failed).await;
            self.logger.log_run_failed(failed_in, e).await;
        }

        if let Ok(mut history) = self.last_history.lock() {
            *history = tracker.history().to_vec();
        }
        self.logger.end_run(&correlation_id, outcome.is_ok()).await;

        outcome
    }

    async fn execute(&self, tracker: &mut RunTracker) -> Result<BenchmarkReport> {
        let started_at = Utc::now();

        self.enter(tracker, RunState::SelectingEndpoint).await?;
        let endpoint = self.directory.select_endpoint().await?;
        self.logger.log_endpoint_selected(&endpoint).await;

        self.enter(tracker, RunState::ProbingLatency).await?;
        let latency = self.latency.measure(&endpoint).await?;

        self.enter(tracker, RunState::BenchmarkingDownload).await?;
        let download = self.measure_direction(&endpoint, TransferDirection::Download).await?;

        self.enter(tracker, RunState::BenchmarkingUpload).await?;
        let upload = self.measure_direction(&endpoint, TransferDirection::Upload).await?;

        self.enter(tracker, RunState::Reporting).await?;
        let report = BenchmarkReport::new(endpoint, latency, download, upload, started_at);

        self.enter(tracker, RunState::Done).await?;
        Ok(report)
    }

    async fn measure_direction(
        &self,
        endpoint: &EndpointDescriptor,
        direction: TransferDirection,
    ) -> Result<TransferSummary> {
        let timings = self.transfers.run_transfers(endpoint, direction).await;
        let summary = ResultAggregator::summarize(direction, &timings, self.transfers.chunk_bytes(direction))?;
        self.logger.log_summary(&summary).await;
        Ok(summary)
    }

    async fn enter(&self, tracker: &mut RunTracker, next: RunState) -> Result<()> {
        let previous = tracker.advance(next)?;
        self.logger.log_state(previous, next).await;
        Ok(())
    }
}
