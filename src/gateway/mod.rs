//! Gateway server implementation

mod handler;
pub mod request_id;
mod response;
mod server;

pub use handler::{AppState, create_router, handle};
pub use response::to_http;
pub use server::Gateway;
