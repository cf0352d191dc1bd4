//! Request id generation and task-local propagation.
//!
//! A request id is a UUID v4 string prefixed with `"req-"`, minted once per
//! inbound request. It is attached to the request's tracing span and sent to
//! the engine as the `X-Request-Id` header.
//!
//! The current id lives in [`REQUEST_ID`], a `tokio::task_local!` slot. Use
//! [`with_request_id`] to scope a future to an id and [`current`] to read it
//! from anywhere below that future.

use uuid::Uuid;

tokio::task_local! {
    /// Task-local storage for the current request id.
    pub static REQUEST_ID: String;
}

/// Generate a new request id: `"req-<uuid-v4>"`.
#[must_use]
pub fn generate() -> String {
    format!("req-{}", Uuid::new_v4())
}

/// Request id of the current task, `None` outside a [`with_request_id`] scope.
#[must_use]
pub fn current() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// Run `future` with `request_id` installed as the task-local request id.
pub async fn with_request_id<F, T>(request_id: String, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    REQUEST_ID.scope(request_id, future).await
}
