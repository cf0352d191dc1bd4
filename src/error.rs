//! Error types for the certificate gateway

use std::io;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias for the certificate gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Certificate gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Client-caused error; the only variant answered with HTTP 400.
    #[error("{message}")]
    BadRequest {
        /// Message echoed back to the client
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Certificate could not be parsed
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Request body could not be captured
    #[error("Body error: {0}")]
    Body(String),

    /// Execution engine failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Whether this error is a client-caused bad request
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest { .. })
    }

    /// HTTP status this error maps to
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::BadRequest { message } => message,
            // Internal details stay in the logs
            _ => "Internal Server Error".to_string(),
        };
        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}
