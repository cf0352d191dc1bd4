//! Catch-all route and the per-request pipeline.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{Instrument, debug, error, info_span, warn};

use super::request_id;
use super::response::to_http;
use crate::Result;
use crate::config::Config;
use crate::engine::ExecutionEngine;
use crate::identity::resolve_identity;
use crate::request::{RawRequest, capture_body, extract_params};
use crate::settings::RequestSettings;
use crate::translate::translate;

/// Shared, read-only application state
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Engine receiving canonical requests
    pub engine: Arc<dyn ExecutionEngine>,
}

/// Create the router: every method on every path goes through [`handle`].
///
/// There are no routes, only a fallback, so no extractor can reject a request
/// before it reaches the pipeline.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(catch_all)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn catch_all(State(state): State<Arc<AppState>>, request: Request) -> Response {
    handle(&state, RawRequest::new(request)).await
}

/// Run one request through the pipeline inside its own span and request id
/// scope, turning any error into a response.
///
/// A bad request becomes a 400 echoing its message; anything else becomes a
/// generic 500.
pub async fn handle(state: &AppState, raw: RawRequest) -> Response {
    let id = request_id::generate();
    let uri = raw.head.uri.clone();
    let span = info_span!(
        "request",
        request_id = %id,
        method = %raw.head.method,
        uri = %uri,
    );

    let outcome = request_id::with_request_id(id, serve(state, raw))
        .instrument(span.clone())
        .await;

    span.in_scope(|| match outcome {
        Ok(response) => response,
        Err(e) if e.is_bad_request() => {
            warn!(uri = %uri, message = %e, "Bad request");
            e.into_response()
        }
        Err(e) => {
            error!(uri = %uri, error = %e, "Request failed");
            e.into_response()
        }
    })
}

/// capture body → resolve identity → extract params → translate → engine → HTTP
async fn serve(state: &AppState, raw: RawRequest) -> Result<Response> {
    let settings = RequestSettings::from_config(&state.config);
    let RawRequest { head, body } = raw;

    let body = capture_body(body, head.content_type(), state.config.server.max_body_bytes).await?;
    let identity = resolve_identity(&settings, &head.headers, head.peer_cert.as_ref())?;
    let params = extract_params(head.uri.query(), head.content_type(), &body);

    let canonical = translate(&head, body, params, identity);
    debug!(
        client = ?canonical.client_cert_cn,
        authenticated = canonical.authenticated,
        params = canonical.params.len(),
        "Forwarding to engine"
    );

    let response = state.engine.handle(canonical).await?;
    to_http(response)
}
