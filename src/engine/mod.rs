//! Execution engine boundary.
//!
//! The engine does the actual work behind the gateway. It accepts only a
//! [`CanonicalRequest`] and answers with an [`EngineResponse`]; it knows
//! nothing about TLS or how the client was identified.

mod http;

pub use http::HttpEngine;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;
use crate::translate::CanonicalRequest;

/// Header carrying the engine version, both from the engine and to the client.
pub const VERSION_HEADER: &str = "x-engine-version";

/// What the engine hands back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
    /// Media type of `body`
    pub content_type: String,
    /// Version of the engine that produced the response
    pub engine_version: String,
}

impl EngineResponse {
    /// A response with status 200.
    pub fn ok(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: content_type.into(),
            engine_version: String::new(),
        }
    }

    /// Set the engine version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = version.into();
        self
    }
}

/// The external collaborator that processes canonical requests.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Process one request.
    async fn handle(&self, request: CanonicalRequest) -> Result<EngineResponse>;
}
