//! Certificate handles and subject extraction.
//!
//! A [`Certificate`] owns DER bytes and parses them on demand with
//! `x509-parser`. The TLS listener hands the gateway a [`PeerCertificate`]
//! (already chain-validated); header-supplied certificates are validated when
//! decoded.

use std::fmt;

use rustls::pki_types::CertificateDer;
use pem::{EncodeConfig, LineEnding};
use serde::{Serialize, Serializer};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Certificate
// ─────────────────────────────────────────────────────────────────────────────

/// An X.509 certificate held as DER.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: CertificateDer<'static>,
}

impl Certificate {
    /// Wrap DER bytes without parsing them.
    #[must_use]
    pub fn new(der: CertificateDer<'static>) -> Self {
        Self { der }
    }

    /// Wrap DER bytes, failing if they are not a parseable X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` with the parser's message.
    pub fn parse(der: CertificateDer<'static>) -> Result<Self> {
        X509Certificate::from_der(der.as_ref())
            .map_err(|e| Error::Certificate(e.to_string()))?;
        Ok(Self { der })
    }

    /// Raw DER bytes
    #[must_use]
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    /// Subject DN rendered as a string (`CN=alice, O=example`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the DER cannot be parsed.
    pub fn subject_dn(&self) -> Result<String> {
        self.with_parsed(|cert| cert.subject().to_string())
    }

    /// Common Name of the subject DN, `None` when the subject has no
    /// string-valued CN.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the DER cannot be parsed.
    pub fn common_name(&self) -> Result<Option<String>> {
        self.with_parsed(extract_cn)
    }

    /// PEM encoding of the certificate, LF line endings.
    #[must_use]
    pub fn to_pem(&self) -> String {
        let block = pem::Pem::new("CERTIFICATE", self.der.to_vec());
        pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
    }

    fn with_parsed<T>(&self, f: impl FnOnce(&X509Certificate<'_>) -> T) -> Result<T> {
        let (_, cert) = X509Certificate::from_der(self.der.as_ref())
            .map_err(|e| Error::Certificate(format!("Failed to parse client certificate: {e}")))?;
        Ok(f(&cert))
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_dn().ok())
            .field("der_len", &self.der.len())
            .finish()
    }
}

/// Serialized as PEM so the engine receives a self-describing string.
impl Serialize for Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pem())
    }
}

/// Extract the CN attribute from the subject DN.
fn extract_cn(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

// ─────────────────────────────────────────────────────────────────────────────
// Peer certificate (TLS listener boundary)
// ─────────────────────────────────────────────────────────────────────────────

/// Validated client certificate presented during the TLS handshake.
///
/// A TLS-terminating listener inserts this into the request extensions; the
/// gateway only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate(pub Certificate);

impl PeerCertificate {
    /// Wrap the leaf certificate of a peer chain.
    #[must_use]
    pub fn from_der(der: CertificateDer<'static>) -> Self {
        Self(Certificate::new(der))
    }

    /// The underlying certificate
    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.0
    }
}
