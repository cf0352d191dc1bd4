//! Decoding of the `x-client-cert` header.
//!
//! The header carries exactly one PEM certificate, URL-encoded by the
//! upstream TLS terminator. Spaces must arrive as `%20`; `+` is kept as a
//! literal character since it is part of the base64 alphabet.

use std::borrow::Cow;

use crate::identity::certificate::Certificate;
use crate::{Error, Result};

/// Header carrying the URL-encoded client certificate.
pub const CLIENT_CERT_HEADER: &str = "x-client-cert";

/// Decode the raw header value into a single certificate.
///
/// Returns `Ok(None)` when the header is absent.
///
/// # Errors
///
/// Returns `Error::BadRequest` when the value cannot be URL-decoded, does not
/// parse as PEM certificates, or holds zero or more than one certificate.
pub fn decode_header_cert(raw_value: Option<&str>) -> Result<Option<Certificate>> {
    let Some(raw) = raw_value else {
        return Ok(None);
    };

    let decoded = url_decode(raw).map_err(|e| {
        Error::bad_request(format!(
            "Unable to URL decode the {CLIENT_CERT_HEADER} header: {e}"
        ))
    })?;

    let mut certs = pem_certs(&decoded).map_err(|e| {
        Error::bad_request(format!(
            "Unable to parse {CLIENT_CERT_HEADER} into certificate: {e}"
        ))
    })?;

    match certs.len() {
        0 => Err(Error::bad_request(format!(
            "No certs found in PEM read from {CLIENT_CERT_HEADER}"
        ))),
        1 => Ok(certs.pop()),
        n => Err(Error::bad_request(format!(
            "Only 1 PEM should be supplied for {CLIENT_CERT_HEADER} but {n} found"
        ))),
    }
}

/// Percent-decode `raw`, rejecting truncated or non-hex escapes.
fn url_decode(raw: &str) -> std::result::Result<Cow<'_, str>, String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(format!("Incomplete or illegal escape sequence at offset {i}"));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    urlencoding::decode(raw).map_err(|e| e.to_string())
}

/// Parse every `CERTIFICATE` block in `pem`, validating each as X.509.
fn pem_certs(pem: &str) -> std::result::Result<Vec<Certificate>, String> {
    rustls_pemfile::certs(&mut pem.as_bytes())
        .map(|item| {
            let der = item.map_err(|e| e.to_string())?;
            Certificate::parse(der).map_err(|e| e.to_string())
        })
        .collect()
}
