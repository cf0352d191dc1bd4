//! Inbound request representation, body capture and parameter extraction.

pub mod body;
pub mod params;

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{HeaderMap, Method, Uri, header},
};

use crate::identity::PeerCertificate;

pub use body::{CapturedBody, capture_body, declared_encoding};
pub use params::{Params, extract_params};

/// Everything about an inbound request except its body.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// HTTP method as received
    pub method: Method,
    /// Request target
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Peer socket address, when the listener recorded it
    pub remote_addr: Option<SocketAddr>,
    /// Client certificate from the TLS handshake, when the listener terminated TLS
    pub peer_cert: Option<PeerCertificate>,
}

impl RequestHead {
    /// Declared `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// An inbound request whose body has not been read yet.
#[derive(Debug)]
pub struct RawRequest {
    /// Method, target, headers and connection metadata
    pub head: RequestHead,
    /// Unread body stream
    pub body: Body,
}

impl RawRequest {
    /// Split an axum request, picking up the connection metadata the listener
    /// stored in its extensions.
    #[must_use]
    pub fn new(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let peer_cert = parts.extensions.get::<PeerCertificate>().cloned();

        Self {
            head: RequestHead {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                remote_addr,
                peer_cert,
            },
            body,
        }
    }
}
