//! Conversion of an authenticated inbound request into the engine's request shape.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::{Certificate, ClientIdentity};
use crate::request::{CapturedBody, Params, RequestHead};

/// The one request shape the execution engine accepts.
///
/// Every field is always serialized; absent values appear as `null` or `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRequest {
    /// Request path, without the query string
    pub uri: String,
    /// Query and form parameters
    pub params: Params,
    /// Peer IP address
    pub remote_addr: Option<String>,
    /// Request headers, lower-cased names, repeated values joined with `,`
    pub headers: BTreeMap<String, String>,
    /// Decoded request body
    pub body: String,
    /// Upper-cased HTTP method
    pub method: String,
    /// Client certificate, PEM encoded on the wire
    pub client_cert: Option<Certificate>,
    /// CN of the client's DN
    pub client_cert_cn: Option<String>,
    /// Whether the client is authenticated
    pub authenticated: bool,
}

/// Assemble the canonical request.
///
/// Identity fields are copied as a unit from `identity`, so they always come
/// from one trust source.
#[must_use]
pub fn translate(
    head: &RequestHead,
    body: CapturedBody,
    params: Params,
    identity: ClientIdentity,
) -> CanonicalRequest {
    CanonicalRequest {
        uri: head.uri.path().to_string(),
        params,
        remote_addr: head.remote_addr.map(|addr| addr.ip().to_string()),
        headers: flatten_headers(head),
        body: body.into_text(),
        method: head.method.as_str().to_ascii_uppercase(),
        client_cert: identity.certificate,
        client_cert_cn: identity.common_name,
        authenticated: identity.authenticated,
    }
}

fn flatten_headers(head: &RequestHead) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &head.headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PeerCertificate;
    use crate::identity::certificate::test_support::make_cert;
    use axum::http::{HeaderMap, HeaderValue, Method, header::HeaderName};

    fn head(method: &str, uri: &str, headers: &[(&str, &str)]) -> RequestHead {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        RequestHead {
            method: Method::from_bytes(method.as_bytes()).unwrap(),
            uri: uri.parse().unwrap(),
            headers: map,
            remote_addr: Some("192.168.0.7:45123".parse().unwrap()),
            peer_cert: None,
        }
    }

    fn body(s: &'static str) -> CapturedBody {
        CapturedBody::new(s)
    }

    #[test]
    fn copies_request_fields() {
        // GIVEN: a lower-case method and a query string
        let head = head(
            "get",
            "/puppet/v3/catalog/node1?environment=production",
            &[("Accept", "application/json")],
        );
        let mut params = Params::new();
        params.insert("environment".into(), "production".into());

        // WHEN: translating an anonymous request
        let canonical = translate(
            &head,
            body("payload"),
            params.clone(),
            ClientIdentity::unauthenticated(),
        );

        // THEN: the method is upper-cased and the rest is copied verbatim
        assert_eq!(canonical.method, "GET");
        assert_eq!(canonical.uri, "/puppet/v3/catalog/node1");
        assert_eq!(canonical.remote_addr.as_deref(), Some("192.168.0.7"));
        assert_eq!(canonical.headers["accept"], "application/json");
        assert_eq!(canonical.body, "payload");
        assert_eq!(canonical.params, params);
        assert!(canonical.client_cert.is_none());
        assert!(canonical.client_cert_cn.is_none());
        assert!(!canonical.authenticated);
    }

    #[test]
    fn identity_fields_come_from_one_identity() {
        let cert = PeerCertificate::from_der(make_cert(Some("agent1"), None).der().clone());
        let identity = ClientIdentity {
            common_name: Some("agent1".into()),
            authenticated: true,
            certificate: Some(cert.certificate().clone()),
        };

        let canonical = translate(&head("PUT", "/", &[]), body(""), Params::new(), identity);

        assert_eq!(canonical.client_cert_cn.as_deref(), Some("agent1"));
        assert!(canonical.authenticated);
        assert_eq!(canonical.client_cert.as_ref(), Some(cert.certificate()));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let head = head("GET", "/", &[("x-tag", "a"), ("X-Tag", "b")]);
        let canonical = translate(&head, body(""), Params::new(), ClientIdentity::default());
        assert_eq!(canonical.headers["x-tag"], "a,b");
    }

    #[test]
    fn absent_fields_are_serialized_as_null() {
        let mut head = head("POST", "/", &[]);
        head.remote_addr = None;
        let canonical = translate(&head, body(""), Params::new(), ClientIdentity::default());

        let json = serde_json::to_value(&canonical).unwrap();

        assert!(json["remote_addr"].is_null());
        assert!(json["client_cert"].is_null());
        assert!(json["client_cert_cn"].is_null());
        assert_eq!(json["authenticated"], false);
        assert_eq!(json["method"], "POST");
    }

    #[test]
    fn certificate_is_serialized_as_pem() {
        let cert = make_cert(Some("agent1"), None);
        let identity = ClientIdentity {
            common_name: Some("agent1".into()),
            authenticated: true,
            certificate: Some(Certificate::new(cert.der().clone())),
        };
        let canonical = translate(&head("GET", "/", &[]), body(""), Params::new(), identity);

        let json = serde_json::to_value(&canonical).unwrap();

        let pem = json["client_cert"].as_str().unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    }
}
