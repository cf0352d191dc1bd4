//! Trust-switch identity resolution.

use std::borrow::Cow;

use axum::http::HeaderMap;
use tracing::{debug, error, warn};

use super::certificate::PeerCertificate;
use super::dn::DistinguishedName;
use super::header_cert::{CLIENT_CERT_HEADER, decode_header_cert};
use super::ClientIdentity;
use crate::Result;
use crate::settings::RequestSettings;

/// Verify-header value that marks a successful upstream verification.
pub const VERIFY_SUCCESS: &str = "SUCCESS";

/// Resolve the client identity for one request.
///
/// With header-trust enabled only the identity headers are consulted; with it
/// disabled only the TLS peer certificate is. A malformed DN or a peer
/// certificate without a CN yields the unauthenticated identity rather than
/// an error.
///
/// # Errors
///
/// Returns `Error::BadRequest` when `x-client-cert` is present but cannot be
/// decoded into exactly one certificate.
pub fn resolve_identity(
    settings: &RequestSettings,
    headers: &HeaderMap,
    peer_cert: Option<&PeerCertificate>,
) -> Result<ClientIdentity> {
    if settings.allow_header_cert_info {
        header_identity(settings, headers)
    } else {
        warn_ignored_headers(settings, headers);
        Ok(tls_identity(peer_cert))
    }
}

/// Identity taken from headers set by an upstream TLS terminator.
fn header_identity(settings: &RequestSettings, headers: &HeaderMap) -> Result<ClientIdentity> {
    let dn_header = settings.ssl_client_header.as_deref();
    let verify_header = settings.ssl_client_verify_header.as_deref();

    let dn_value = header_value(headers, dn_header);
    let verify_value = header_value(headers, verify_header);
    let cert_value = header_value(headers, Some(CLIENT_CERT_HEADER));

    let parsed_dn = dn_value.as_deref().map(DistinguishedName::parse);

    let (common_name, authenticated) = match parsed_dn {
        Some(Ok(dn)) => {
            let authenticated = verify_value.as_deref() == Some(VERIFY_SUCCESS);
            debug!(
                common_name = ?dn.common_name(),
                authenticated,
                "Client identity taken from headers"
            );
            (dn.common_name().map(str::to_owned), authenticated)
        }
        Some(Err(e)) => {
            error!(
                header = dn_header.unwrap_or_default(),
                dn = dn_value.as_deref().unwrap_or_default(),
                error = %e,
                "DN provided by the HTTP header is malformed"
            );
            warn_unauthenticated_headers(&[
                (dn_header, dn_value.is_some()),
                (verify_header, verify_value.is_some()),
                (Some(CLIENT_CERT_HEADER), cert_value.is_some()),
            ]);
            (None, false)
        }
        None => {
            warn_unauthenticated_headers(&[
                (verify_header, verify_value.is_some()),
                (Some(CLIENT_CERT_HEADER), cert_value.is_some()),
            ]);
            (None, false)
        }
    };

    let certificate = decode_header_cert(cert_value.as_deref())?;

    Ok(ClientIdentity {
        common_name,
        authenticated,
        certificate,
    })
}

/// Warn once per supplied header when header-trust yields no identity.
fn warn_unauthenticated_headers(supplied: &[(Option<&str>, bool)]) {
    for &(name, present) in supplied {
        if let (Some(name), true) = (name, present) {
            warn!(
                header = name,
                "HTTP header was supplied without a valid client DN; request treated as unauthenticated"
            );
        }
    }
}

/// Identity taken from the TLS peer certificate.
fn tls_identity(peer_cert: Option<&PeerCertificate>) -> ClientIdentity {
    let Some(peer) = peer_cert else {
        return ClientIdentity::unauthenticated();
    };

    let common_name = match peer.certificate().common_name() {
        Ok(Some(cn)) => Some(cn),
        Ok(None) => {
            error!(
                subject = ?peer.certificate().subject_dn().ok(),
                "CN could not be found in the peer certificate's subject DN"
            );
            None
        }
        Err(e) => {
            error!(error = %e, "Subject DN could not be read from the peer certificate");
            None
        }
    };

    ClientIdentity {
        authenticated: common_name.is_some(),
        common_name,
        certificate: Some(peer.certificate().clone()),
    }
}

/// Warn about identity headers that header-trust being off makes us ignore.
fn warn_ignored_headers(settings: &RequestSettings, headers: &HeaderMap) {
    for name in [
        settings.ssl_client_header.as_deref(),
        settings.ssl_client_verify_header.as_deref(),
        Some(CLIENT_CERT_HEADER),
    ]
    .into_iter()
    .flatten()
    {
        if header_value(headers, Some(name)).is_some() {
            warn!(
                header = name,
                "HTTP header was specified but allow_header_cert_info is disabled; the header will be ignored"
            );
        }
    }
}

/// Look up a header by name; non-UTF-8 bytes are replaced rather than dropped.
fn header_value<'a>(headers: &'a HeaderMap, name: Option<&str>) -> Option<Cow<'a, str>> {
    let name = name.filter(|n| !n.is_empty())?;
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}
