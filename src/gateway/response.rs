//! Mapping of engine responses onto HTTP responses.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

use crate::engine::{EngineResponse, VERSION_HEADER};
use crate::{Error, Result};

/// Build the client-facing response: status, body, `Content-Type` and the
/// engine version header. An empty version is not sent.
///
/// # Errors
///
/// Returns `Error::Engine` if the engine produced an invalid status code or
/// header value.
pub fn to_http(response: EngineResponse) -> Result<Response> {
    let status = StatusCode::from_u16(response.status)
        .map_err(|e| Error::Engine(format!("Invalid status {}: {e}", response.status)))?;
    let content_type = HeaderValue::from_str(&response.content_type)
        .map_err(|e| Error::Engine(format!("Invalid content type: {e}")))?;

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type);

    if !response.engine_version.is_empty() {
        let version = HeaderValue::from_str(&response.engine_version)
            .map_err(|e| Error::Engine(format!("Invalid engine version: {e}")))?;
        builder = builder.header(VERSION_HEADER, version);
    }

    builder
        .body(Body::from(response.body))
        .map_err(|e| Error::Internal(e.to_string()))
}
