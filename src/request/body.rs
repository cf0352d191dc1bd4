//! One-shot request body capture.
//!
//! [`capture_body`] takes the body stream by value, so once it has run the
//! stream cannot be read again; everything downstream works from the
//! [`CapturedBody`].

use axum::body::Body;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::{Error, Result};

/// The fully read and decoded request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedBody {
    text: String,
}

impl CapturedBody {
    /// Build from text already decoded.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decode raw bytes with `encoding`; malformed sequences become U+FFFD.
    #[must_use]
    pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> Self {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(encoding = encoding.name(), "Request body had malformed sequences");
        }
        Self::new(text)
    }

    /// Re-readable view over the decoded text, as UTF-8 bytes.
    #[must_use]
    pub fn view(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Decoded body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the decoded text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Encoding declared by the `charset` parameter of a `Content-Type` value.
///
/// UTF-8 when there is no charset or its label is unknown.
#[must_use]
pub fn declared_encoding(content_type: Option<&str>) -> &'static Encoding {
    let Some(label) = content_type.and_then(charset_param) else {
        return UTF_8;
    };
    Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        debug!(charset = label, "Unknown request charset, decoding as UTF-8");
        UTF_8
    })
}

/// Read the entire body into memory, decoding it with the declared charset.
///
/// # Errors
///
/// Returns `Error::Body` when the stream fails or exceeds `limit` bytes.
pub async fn capture_body(
    body: Body,
    content_type: Option<&str>,
    limit: usize,
) -> Result<CapturedBody> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| Error::Body(e.to_string()))?;
    let encoding = declared_encoding(content_type);
    debug!(len = bytes.len(), encoding = encoding.name(), "Captured request body");
    Ok(CapturedBody::decode(&bytes, encoding))
}

/// Value of the `charset` parameter of a media type.
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_16LE, WINDOWS_1252};

    #[test]
    fn encoding_defaults_to_utf8() {
        assert_eq!(declared_encoding(None), UTF_8);
        assert_eq!(declared_encoding(Some("application/json")), UTF_8);
        assert_eq!(declared_encoding(Some("text/plain; charset=klingon")), UTF_8);
    }

    #[test]
    fn charset_parameter_is_honoured() {
        // iso-8859-1 resolves to its windows-1252 superset
        assert_eq!(
            declared_encoding(Some("text/plain; charset=ISO-8859-1")),
            WINDOWS_1252
        );
        assert_eq!(
            declared_encoding(Some("text/plain;format=flowed; Charset=\"latin1\"")),
            WINDOWS_1252
        );
        assert_eq!(declared_encoding(Some("text/plain; charset=shift_jis")), SHIFT_JIS);
        assert_eq!(declared_encoding(Some("text/plain; charset=utf-16le")), UTF_16LE);
    }

    #[tokio::test]
    async fn capture_reads_whole_body() {
        let body = Body::from("environment=production&facts=%7B%7D");
        let captured = capture_body(body, None, 1024).await.unwrap();
        assert_eq!(captured.text(), "environment=production&facts=%7B%7D");
        // the view reproduces the captured content as often as needed
        assert_eq!(captured.view(), captured.text().as_bytes());
        assert_eq!(captured.view(), captured.text().as_bytes());
    }

    #[tokio::test]
    async fn capture_decodes_latin1() {
        let body = Body::from(vec![b'c', b'a', b'f', 0xE9]);
        let captured = capture_body(body, Some("text/plain; charset=iso-8859-1"), 1024)
            .await
            .unwrap();
        assert_eq!(captured.text(), "café");
        // the view is over the decoded string, not the wire bytes
        assert_eq!(captured.view(), "café".as_bytes());
    }

    #[tokio::test]
    async fn capture_decodes_utf16() {
        // GIVEN: "hi" encoded as UTF-16LE
        let body = Body::from(vec![b'h', 0, b'i', 0]);
        // WHEN: the request declares that charset
        let captured = capture_body(body, Some("text/plain; charset=utf-16le"), 1024)
            .await
            .unwrap();
        // THEN: the text is decoded, with no interleaved NULs
        assert_eq!(captured.text(), "hi");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let body = Body::from(vec![b'a', 0xFF, b'b']);
        let captured = capture_body(body, None, 1024).await.unwrap();
        assert_eq!(captured.text(), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn capture_empty_body() {
        let captured = capture_body(Body::empty(), None, 1024).await.unwrap();
        assert_eq!(captured.text(), "");
        assert!(captured.view().is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_fatal() {
        let body = Body::from(vec![b'x'; 64]);
        let err = capture_body(body, None, 16).await.unwrap_err();
        assert!(matches!(err, Error::Body(_)));
        assert!(!err.is_bad_request());
    }
}
