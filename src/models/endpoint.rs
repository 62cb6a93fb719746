//! Measurement endpoint descriptor returned by the server directory

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port assumed when a directory `host` entry carries none
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// A candidate measurement endpoint.
///
/// Selected once per run and passed by value through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// `host[:port]` used to build download/upload URLs and probe targets
    pub host: String,

    /// Organisation operating the server
    #[serde(default)]
    pub sponsor: String,

    /// Server location name (usually a city)
    #[serde(default)]
    pub name: String,

    /// Country the server is located in
    #[serde(default)]
    pub country: String,

    /// Legacy upload URL advertised by the directory
    #[serde(default)]
    pub url: String,
}

impl EndpointDescriptor {
    /// Build a descriptor for a fixed host, bypassing the directory
    pub fn from_host<S: Into<String>>(host: S) -> Result<Self> {
        let host = host.into().trim().to_string();
        let descriptor = Self {
            sponsor: host.clone(),
            name: "custom".to_string(),
            country: String::new(),
            url: format!("http://{}/upload", host),
            host,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check that `host` is usable as `host[:port]`
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::validation("Endpoint host cannot be empty"));
        }
        if self.host.contains('/') || self.host.contains(char::is_whitespace) {
            return Err(AppError::validation(format!(
                "Endpoint host must be in host[:port] form: {}",
                self.host
            )));
        }
        self.probe_target().map(|_| ())
    }

    /// Base URL for download/upload requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.host)
    }

    /// Split `host[:port]` into a hostname and port for latency probing
    pub fn probe_target(&self) -> Result<(String, u16)> {
        let parsed = url::Url::parse(&self.base_url()).map_err(|e| {
            AppError::validation(format!("Invalid endpoint host '{}': {}", self.host, e))
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| AppError::validation(format!("Endpoint '{}' has no host", self.host)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = parsed.port().unwrap_or(DEFAULT_HTTP_PORT);
        Ok((host, port))
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.sponsor, self.name, self.country)
    }
}
