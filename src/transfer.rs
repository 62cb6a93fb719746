//! Timed bulk transfers against the selected endpoint
//!
//! Each phase launches a fixed number of transfers concurrently and waits for
//! all of them. Every transfer is timed independently. A failed attempt is
//! recorded as a zero-byte timing rather than aborting the phase. Dropping a
//! phase before it settles aborts the transfers still in flight.

use crate::{
    error::{AppError, Result},
    logging::BenchmarkLogger,
    models::{Config, EndpointDescriptor, TransferTiming},
    types::TransferDirection,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{header::CONTENT_TYPE, Client};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tempfile::NamedTempFile;
use tokio::{
    io::{AsyncWriteExt, BufWriter},
    task::JoinSet,
};
use uuid::Uuid;

/// Produces one direction's timing dataset for an endpoint
#[async_trait]
pub trait TransferRunner: Send + Sync {
    /// Run the configured number of transfers and return one timing per attempt
    async fn run_transfers(
        &self,
        endpoint: &EndpointDescriptor,
        direction: TransferDirection,
    ) -> Vec<TransferTiming>;

    /// Size of one chunk in the given direction
    fn chunk_bytes(&self, direction: TransferDirection) -> u64;
}

/// Parameters of the transfer phases
#[derive(Debug, Clone)]
pub struct TransferSettings {
    /// Concurrent transfers per direction
    pub count: u32,
    /// Bytes requested per download
    pub download_size_bytes: u64,
    /// Bytes sent per upload
    pub upload_size_bytes: u64,
    /// Write block size for spooling downloads
    pub download_block_bytes: usize,
    /// Timeout covering a whole request including its body
    pub request_timeout: Duration,
    /// Directory for spooled downloads; the system temp dir when `None`
    pub spool_dir: Option<PathBuf>,
}

impl From<&Config> for TransferSettings {
    fn from(config: &Config) -> Self {
        Self {
            count: config.transfer_count,
            download_size_bytes: config.download_size_bytes,
            upload_size_bytes: config.upload_size_bytes,
            download_block_bytes: config.download_block_bytes,
            request_timeout: config.request_timeout(),
            spool_dir: None,
        }
    }
}

/// Fresh cache-busting token for one request
pub fn cache_busting_token() -> String {
    Uuid::new_v4().to_string()
}

/// `GET` target for one download
pub fn download_url(endpoint: &EndpointDescriptor, token: &str, size_bytes: u64) -> String {
    format!("{}/download?nocache={}&size={}", endpoint.base_url(), token, size_bytes)
}

/// `POST` target for one upload
pub fn upload_url(endpoint: &EndpointDescriptor, token: &str) -> String {
    format!("{}/upload?nocache={}", endpoint.base_url(), token)
}

/// HTTP-backed transfer benchmark
pub struct TransferBenchmark {
    client: Client,
    settings: TransferSettings,
    logger: BenchmarkLogger,
}

impl TransferBenchmark {
    /// Create a benchmark with its own HTTP client
    pub fn new(settings: TransferSettings, logger: BenchmarkLogger) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(crate::defaults::USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, settings, logger })
    }

    /// Transfer settings in use
    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// One timed download
    pub async fn run_download(&self, endpoint: &EndpointDescriptor) -> TransferTiming {
        Self::download(self.client.clone(), endpoint.clone(), self.settings.clone()).await
    }

    /// One timed upload
    pub async fn run_upload(&self, endpoint: &EndpointDescriptor) -> TransferTiming {
        match upload_body(self.settings.upload_size_bytes) {
            Ok(payload) => Self::upload(self.client.clone(), endpoint.clone(), payload).await,
            Err(e) => TransferTiming::failed(TransferDirection::Upload, Duration::ZERO, e.to_string()),
        }
    }

    /// The download dataset: `count` concurrent downloads
    pub async fn run_downloads(&self, endpoint: &EndpointDescriptor) -> Vec<TransferTiming> {
        self.run_concurrent(endpoint, TransferDirection::Download).await
    }

    /// The upload dataset: `count` concurrent uploads
    pub async fn run_uploads(&self, endpoint: &EndpointDescriptor) -> Vec<TransferTiming> {
        self.run_concurrent(endpoint, TransferDirection::Upload).await
    }

    async fn run_concurrent(
        &self,
        endpoint: &EndpointDescriptor,
        direction: TransferDirection,
    ) -> Vec<TransferTiming> {
        let count = self.settings.count as usize;

        // One upload body shared by every task
        let payload = match direction {
            TransferDirection::Download => None,
            TransferDirection::Upload => match upload_body(self.settings.upload_size_bytes) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    let timings: Vec<TransferTiming> = (0..count)
                        .map(|_| TransferTiming::failed(direction, Duration::ZERO, e.to_string()))
                        .collect();
                    self.log_all(&timings).await;
                    return timings;
                }
            },
        };

        // Dropping the set aborts every task still running
        let mut tasks = JoinSet::new();
        for _ in 0..count {
            let client = self.client.clone();
            let endpoint = endpoint.clone();
            let settings = self.settings.clone();
            let payload = payload.clone();

            tasks.spawn(async move {
                match payload {
                    Some(payload) => Self::upload(client, endpoint, payload).await,
                    None => Self::download(client, endpoint, settings).await,
                }
            });
        }

        let mut timings = Vec::with_capacity(count);
        while let Some(joined) = tasks.join_next().await {
            let timing = joined.unwrap_or_else(|e| {
                TransferTiming::failed(direction, Duration::ZERO, format!("transfer task aborted: {}", e))
            });
            timings.push(timing);
        }

        self.log_all(&timings).await;
        timings
    }

    async fn log_all(&self, timings: &[TransferTiming]) {
        for (index, timing) in timings.iter().enumerate() {
            self.logger.log_transfer(index, timing).await;
        }
    }

    async fn download(client: Client, endpoint: EndpointDescriptor, settings: TransferSettings) -> TransferTiming {
        let direction = TransferDirection::Download;

        // The spool exists before the clock starts and is removed when it drops
        let spool = match create_spool(settings.spool_dir.as_ref()) {
            Ok(spool) => spool,
            Err(e) => return TransferTiming::failed(direction, Duration::ZERO, e.to_string()),
        };

        let requested = settings.download_size_bytes;
        let url = download_url(&endpoint, &cache_busting_token(), requested);
        let start = Instant::now();
        let outcome = download_into(&client, &url, &spool, settings.download_block_bytes, requested).await;
        let elapsed = start.elapsed();
        drop(spool);

        match outcome {
            Ok(bytes) => TransferTiming::success(direction, bytes, elapsed),
            Err(e) => TransferTiming::failed(direction, elapsed, e.to_string()),
        }
    }

    async fn upload(client: Client, endpoint: EndpointDescriptor, payload: Bytes) -> TransferTiming {
        let direction = TransferDirection::Upload;
        let size_bytes = payload.len() as u64;

        let url = upload_url(&endpoint, &cache_busting_token());
        let start = Instant::now();
        let outcome = upload_payload(&client, &url, payload).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => TransferTiming::success(direction, size_bytes, elapsed),
            Err(e) => TransferTiming::failed(direction, elapsed, e.to_string()),
        }
    }
}

#[async_trait]
impl TransferRunner for TransferBenchmark {
    async fn run_transfers(
        &self,
        endpoint: &EndpointDescriptor,
        direction: TransferDirection,
    ) -> Vec<TransferTiming> {
        self.run_concurrent(endpoint, direction).await
    }

    fn chunk_bytes(&self, direction: TransferDirection) -> u64 {
        match direction {
            TransferDirection::Download => self.settings.download_size_bytes,
            TransferDirection::Upload => self.settings.upload_size_bytes,
        }
    }
}

fn create_spool(dir: Option<&PathBuf>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("nst-download-").suffix(".bin");
    let spool = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    };
    spool.map_err(|e| AppError::io(format!("cannot create download spool file: {}", e)))
}

/// Zero-filled upload body of exactly `size_bytes`
fn upload_body(size_bytes: u64) -> Result<Bytes> {
    let len = usize::try_from(size_bytes)
        .map_err(|_| AppError::transfer_failed(format!("upload size {} does not fit in memory", size_bytes)))?;
    Ok(Bytes::from(vec![0u8; len]))
}

/// Stream a download body into `spool`, returning the bytes written.
///
/// A body shorter than either its Content-Length or `requested` is a partial
/// transfer and fails.
async fn download_into(
    client: &Client,
    url: &str,
    spool: &NamedTempFile,
    block_bytes: usize,
    requested: u64,
) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::transfer_failed(format!("GET {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::transfer_failed(format!("GET {} answered with HTTP {}", url, status)));
    }

    let advertised = response.content_length();
    let file = tokio::fs::File::from_std(spool.as_file().try_clone()?);
    let mut writer = BufWriter::with_capacity(block_bytes, file);
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::transfer_failed(format!("download interrupted after {} bytes: {}", written, e))
        })?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;

    if let Some(expected) = advertised {
        if written < expected {
            return Err(AppError::transfer_failed(format!(
                "partial download: {} of {} bytes",
                written, expected
            )));
        }
    }
    if written == 0 {
        return Err(AppError::transfer_failed(format!("GET {} returned an empty body", url)));
    }
    if written < requested {
        return Err(AppError::transfer_failed(format!(
            "partial download: {} of {} requested bytes",
            written, requested
        )));
    }

    Ok(written)
}

/// Send the whole payload in one request and consume the response
async fn upload_payload(client: &Client, url: &str, payload: Bytes) -> Result<()> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(payload)
        .send()
        .await
        .map_err(|e| AppError::transfer_failed(format!("POST {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::transfer_failed(format!("POST {} answered with HTTP {}", url, status)));
    }

    response
        .bytes()
        .await
        .map_err(|e| AppError::transfer_failed(format!("reading upload response: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use tempfile::TempDir;
    use tokio::{io::AsyncReadExt, net::TcpListener};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, Request, ResponseTemplate,
    };

    fn settings(count: u32, spool_dir: &TempDir) -> TransferSettings {
        TransferSettings {
            count,
            download_size_bytes: 64 * 1024,
            upload_size_bytes: 32 * 1024,
            download_block_bytes: 8 * 1024,
            request_timeout: Duration::from_secs(10),
            spool_dir: Some(spool_dir.path().to_path_buf()),
        }
    }

    fn endpoint_for(server: &MockServer) -> EndpointDescriptor {
        let host = server.uri().trim_start_matches("http://").to_string();
        EndpointDescriptor::from_host(host).unwrap()
    }

    fn benchmark(settings: TransferSettings) -> TransferBenchmark {
        let logger = BenchmarkLogger::with_logger(Logger::capturing("TEST".to_string()).0);
        TransferBenchmark::new(settings, logger).unwrap()
    }

    fn spool_is_empty(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    async fn spool_empties_within(dir: &TempDir, within: Duration) -> bool {
        let deadline = Instant::now() + within;
        loop {
            if spool_is_empty(dir) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Answers every request with a 200 advertising `advertised` bytes, then
    /// closes the connection after sending only `sent` of them
    async fn truncating_server(advertised: usize, sent: usize) -> EndpointDescriptor {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }

                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
                        advertised
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&vec![1u8; sent]).await;
                    let _ = socket.flush().await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        EndpointDescriptor::from_host(addr.to_string()).unwrap()
    }

    #[test]
    fn test_url_builders() {
        let endpoint = EndpointDescriptor::from_host("h.example:8080").unwrap();
        assert_eq!(
            download_url(&endpoint, "tok", 25_000_000),
            "http://h.example:8080/download?nocache=tok&size=25000000"
        );
        assert_eq!(upload_url(&endpoint, "tok"), "http://h.example:8080/upload?nocache=tok");
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(cache_busting_token(), cache_busting_token());
    }

    #[tokio::test]
    async fn test_concurrent_downloads_succeed_and_clean_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .and(query_param("size", "65536"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64 * 1024]))
            .expect(4)
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(4, &spool_dir));
        let timings = bench.run_downloads(&endpoint_for(&server)).await;

        assert_eq!(timings.len(), 4);
        for timing in &timings {
            assert!(timing.is_successful(), "{:?}", timing.error_message);
            assert_eq!(timing.bytes_transferred, 64 * 1024);
            assert_eq!(timing.direction, TransferDirection::Download);
        }
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_each_download_uses_fresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(3, &spool_dir));
        bench.run_downloads(&endpoint_for(&server)).await;

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let mut tokens: Vec<String> = requests
            .iter()
            .filter_map(|r| r.url.query_pairs().find(|(k, _)| k == "nocache").map(|(_, v)| v.into_owned()))
            .collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_download_recorded_and_spool_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(2, &spool_dir));
        let timings = bench.run_downloads(&endpoint_for(&server)).await;

        assert_eq!(timings.len(), 2);
        assert!(timings.iter().all(|t| !t.is_successful() && t.bytes_transferred == 0));
        assert!(timings[0].error_message.as_deref().unwrap().contains("500"));
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_failed_timings() {
        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(2, &spool_dir));
        let endpoint = EndpointDescriptor::from_host("127.0.0.1:1").unwrap();

        let downloads = bench.run_downloads(&endpoint).await;
        let uploads = bench.run_uploads(&endpoint).await;

        assert_eq!(downloads.len(), 2);
        assert_eq!(uploads.len(), 2);
        assert!(downloads.iter().chain(uploads.iter()).all(|t| !t.is_successful()));
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_empty_download_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(1, &spool_dir));
        let timing = bench.run_download(&endpoint_for(&server)).await;

        assert!(!timing.is_successful());
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_download_shorter_than_requested_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(2, &spool_dir));
        let timings = bench.run_downloads(&endpoint_for(&server)).await;

        assert_eq!(timings.len(), 2);
        for timing in &timings {
            assert!(!timing.is_successful());
            assert_eq!(timing.bytes_transferred, 0);
            assert!(timing
                .error_message
                .as_deref()
                .unwrap()
                .contains("partial download: 16 of 65536"));
        }
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_download_cut_off_mid_body_removes_spool() {
        // More than one write block reaches the spool before the connection drops
        let endpoint = truncating_server(64 * 1024, 40_000).await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(3, &spool_dir));
        let timings = bench.run_downloads(&endpoint).await;

        assert_eq!(timings.len(), 3);
        for timing in &timings {
            assert!(!timing.is_successful());
            assert_eq!(timing.bytes_transferred, 0);
            let message = timing.error_message.as_deref().unwrap();
            assert!(
                message.contains("interrupted") || message.contains("partial download"),
                "{}",
                message
            );
        }
        assert!(spool_is_empty(&spool_dir));
    }

    #[tokio::test]
    async fn test_dropping_a_phase_aborts_its_transfers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![7u8; 64 * 1024])
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(2, &spool_dir));
        let endpoint = endpoint_for(&server);

        let cut_short = tokio::time::timeout(Duration::from_millis(300), bench.run_downloads(&endpoint)).await;
        assert!(cut_short.is_err());

        // Running tasks would keep their spools until the delayed bodies arrive
        assert!(spool_empties_within(&spool_dir, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_uploads_send_exact_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("size=32768"))
            .expect(3)
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(3, &spool_dir));
        let timings = bench.run_uploads(&endpoint_for(&server)).await;

        assert_eq!(timings.len(), 3);
        assert!(timings.iter().all(|t| t.is_successful() && t.bytes_transferred == 32 * 1024));

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.body.len() == 32 * 1024));
    }

    #[tokio::test]
    async fn test_upload_rejected_by_server_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(1, &spool_dir));
        let timing = bench.run_upload(&endpoint_for(&server)).await;

        assert!(!timing.is_successful());
        assert!(timing.error_message.unwrap().contains("413"));
    }

    #[tokio::test]
    async fn test_runner_trait_reports_chunk_sizes() {
        let spool_dir = TempDir::new().unwrap();
        let bench = benchmark(settings(1, &spool_dir));
        assert_eq!(bench.chunk_bytes(TransferDirection::Download), 64 * 1024);
        assert_eq!(bench.chunk_bytes(TransferDirection::Upload), 32 * 1024);
    }
}
