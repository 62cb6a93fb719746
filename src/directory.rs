//! Endpoint discovery through the remote server directory

use crate::{
    error::{AppError, Result},
    models::EndpointDescriptor,
};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use std::time::Duration;

/// Source of the measurement endpoint for a run
#[async_trait]
pub trait EndpointDirectory: Send + Sync {
    /// Select one endpoint, or fail with a directory error
    async fn select_endpoint(&self) -> Result<EndpointDescriptor>;
}

/// Pick the first record of a directory response body.
///
/// No ranking is performed; the directory's order is trusted.
pub fn select_first(body: &str) -> Result<EndpointDescriptor> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| AppError::directory_parse(format!("expected a JSON array of servers: {}", e)))?;

    let first = records
        .into_iter()
        .next()
        .ok_or_else(|| AppError::directory_unavailable("directory returned no servers"))?;

    let endpoint: EndpointDescriptor = serde_json::from_value(first)
        .map_err(|e| AppError::directory_parse(format!("first server record is malformed: {}", e)))?;

    endpoint
        .validate()
        .map_err(|e| AppError::directory_parse(format!("first server record is unusable: {}", e)))?;

    Ok(endpoint)
}

/// Directory backed by an HTTP service returning a JSON server list
pub struct HttpEndpointDirectory {
    client: Client,
    directory_url: String,
}

impl HttpEndpointDirectory {
    /// Create a directory client for the given URL
    pub fn new(directory_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::defaults::USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, directory_url })
    }

    /// URL this directory queries
    pub fn url(&self) -> &str {
        &self.directory_url
    }
}

#[async_trait]
impl EndpointDirectory for HttpEndpointDirectory {
    async fn select_endpoint(&self) -> Result<EndpointDescriptor> {
        let response = self.client
            .get(&self.directory_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::directory_unavailable(format!("request to {} failed: {}", self.directory_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::directory_unavailable(format!(
                "{} answered with HTTP {}",
                self.directory_url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::directory_unavailable(format!("failed to read directory response: {}", e)))?;

        select_first(&body)
    }
}

/// Directory that always yields one fixed endpoint
pub struct StaticEndpointDirectory {
    endpoint: EndpointDescriptor,
}

impl StaticEndpointDirectory {
    pub fn new(endpoint: EndpointDescriptor) -> Self {
        Self { endpoint }
    }

    /// Build from a `host[:port]` string
    pub fn from_host(host: &str) -> Result<Self> {
        Ok(Self::new(EndpointDescriptor::from_host(host)?))
    }
}

#[async_trait]
impl EndpointDirectory for StaticEndpointDirectory {
    async fn select_endpoint(&self) -> Result<EndpointDescriptor> {
        Ok(self.endpoint.clone())
    }
}
