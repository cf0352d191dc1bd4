//! Engine reached over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::debug;

use super::{EngineResponse, ExecutionEngine, VERSION_HEADER};
use crate::config::EngineConfig;
use crate::gateway::request_id;
use crate::translate::CanonicalRequest;
use crate::{Error, Result};

/// Header carrying the gateway's request id to the engine
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fallback media type when the engine does not declare one
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Forwards canonical requests to a remote engine as JSON.
///
/// The upstream status, body, `Content-Type` and version header are passed
/// back unchanged; only transport failures become errors.
pub struct HttpEngine {
    client: Client,
    url: String,
}

impl HttpEngine {
    /// Create an engine client posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Engine` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Engine(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Create an engine client from the `engine` config section.
    ///
    /// # Errors
    ///
    /// Returns `Error::Engine` if the HTTP client cannot be built.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.timeout)
    }
}

#[async_trait]
impl ExecutionEngine for HttpEngine {
    async fn handle(&self, request: CanonicalRequest) -> Result<EngineResponse> {
        let mut outbound = self.client.post(&self.url).json(&request);
        if let Some(id) = request_id::current() {
            outbound = outbound.header(REQUEST_ID_HEADER, id);
        }

        let response = outbound.send().await?;

        let status = response.status().as_u16();
        let content_type = header_str(response.headers(), header::CONTENT_TYPE.as_str())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let engine_version = header_str(response.headers(), VERSION_HEADER).unwrap_or_default();
        let body = response.bytes().await?;

        debug!(
            url = %self.url,
            status,
            len = body.len(),
            engine_version = %engine_version,
            "Engine responded"
        );

        Ok(EngineResponse {
            status,
            body,
            content_type,
            engine_version,
        })
    }
}

fn header_str(headers: &header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
