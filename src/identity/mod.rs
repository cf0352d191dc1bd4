//! Client identity resolution.
//!
//! Every request is attributed to a client through exactly one trust source:
//!
//! ```text
//! allow_header_cert_info = false          allow_header_cert_info = true
//!   TLS handshake                           upstream TLS terminator
//!     → PeerCertificate extension             → DN header + verify header
//!     → CN of subject DN                      → x-client-cert (URL-encoded PEM)
//!                  ╲                        ╱
//!                   → ClientIdentity { common_name, authenticated, certificate }
//! ```
//!
//! # Modules
//!
//! - [`certificate`]: DER certificate handle and subject extraction
//! - [`dn`]: X.500 DN string parsing for header-supplied names
//! - [`header_cert`]: `x-client-cert` decoding
//! - [`resolver`]: picks the trust source and builds the identity

pub mod certificate;
pub mod dn;
pub mod header_cert;
pub mod resolver;

pub use certificate::{Certificate, PeerCertificate};
pub use header_cert::{CLIENT_CERT_HEADER, decode_header_cert};
pub use resolver::resolve_identity;

/// Who the client is, as far as this request is concerned.
///
/// All three fields come from the same trust source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIdentity {
    /// CN of the client's DN
    pub common_name: Option<String>,
    /// Whether the client counts as authenticated
    pub authenticated: bool,
    /// The client certificate, when one was supplied
    pub certificate: Option<Certificate>,
}

impl ClientIdentity {
    /// The identity of an anonymous client.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::default()
    }
}
