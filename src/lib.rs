//! Certificate Gateway Library
//!
//! Front-end gateway that decides who each inbound HTTP client is and hands
//! the request to an execution engine in a single canonical shape.
//!
//! # Features
//!
//! - **Two trust sources**: the TLS peer certificate, or identity headers set
//!   by an upstream TLS terminator, never both for one request
//! - **Header certificates**: URL-encoded PEM in `x-client-cert`
//! - **One-shot body capture**: the body is read once and shared by parameter
//!   extraction and forwarding
//! - **Pluggable engine**: any [`engine::ExecutionEngine`], with an HTTP
//!   forwarding implementation included
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cert_gateway::{config::Config, engine::HttpEngine, gateway::Gateway};
//!
//! let config = Config::load(None)?;
//! let engine = Arc::new(HttpEngine::from_config(&config.engine)?);
//! Gateway::new(config, engine).run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod request;
pub mod settings;
pub mod translate;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
    }
}
