//! Per-request settings derived from the loaded configuration.

use crate::config::{AuthorizationConfig, Config};

/// Immutable trust settings consulted while resolving a client identity.
///
/// Recomputed for every request from [`Config`]; nothing here is cached
/// between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSettings {
    /// Take identity from headers rather than the TLS peer certificate.
    pub allow_header_cert_info: bool,
    /// HTTP header carrying the verification result, if configured.
    pub ssl_client_verify_header: Option<String>,
    /// HTTP header carrying the client DN, if configured.
    pub ssl_client_header: Option<String>,
}

impl RequestSettings {
    /// Derive settings from the global configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::from_authorization(&config.authorization)
    }

    /// Derive settings from the `authorization` section alone.
    #[must_use]
    pub fn from_authorization(auth: &AuthorizationConfig) -> Self {
        Self {
            allow_header_cert_info: auth.allow_header_cert_info,
            ssl_client_verify_header: auth.ssl_client_verify_header.as_deref().map(header_name),
            ssl_client_header: auth.ssl_client_header.as_deref().map(header_name),
        }
    }
}

/// Turn a raw setting string into a canonical HTTP header name.
///
/// The first `_`-separated segment is dropped, the rest are joined with `-`
/// and lower-cased: `"HTTP_X_CLIENT_DN"` becomes `"x-client-dn"`.
#[must_use]
pub fn header_name(raw: &str) -> String {
    raw.split('_').skip(1).collect::<Vec<_>>().join("-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_name_drops_first_segment() {
        assert_eq!(header_name("puppet_ssl_client_header"), "ssl-client-header");
        assert_eq!(
            header_name("x_ssl_client_verify_header"),
            "ssl-client-verify-header"
        );
    }

    #[test]
    fn header_name_lowercases_cgi_style_names() {
        assert_eq!(header_name("HTTP_X_CLIENT_DN"), "x-client-dn");
        assert_eq!(header_name("HTTP_X_CLIENT_VERIFY"), "x-client-verify");
    }

    #[test]
    fn header_name_without_separator_is_empty() {
        assert_eq!(header_name("single"), "");
        assert_eq!(header_name(""), "");
    }

    #[test]
    fn from_config_uses_defaults() {
        let settings = RequestSettings::from_config(&Config::default());
        assert!(!settings.allow_header_cert_info);
        assert_eq!(settings.ssl_client_header.as_deref(), Some("x-client-dn"));
        assert_eq!(
            settings.ssl_client_verify_header.as_deref(),
            Some("x-client-verify")
        );
    }

    #[test]
    fn missing_keys_yield_none() {
        let auth = AuthorizationConfig {
            allow_header_cert_info: true,
            ssl_client_header: None,
            ssl_client_verify_header: None,
        };
        let settings = RequestSettings::from_authorization(&auth);
        assert!(settings.allow_header_cert_info);
        assert!(settings.ssl_client_header.is_none());
        assert!(settings.ssl_client_verify_header.is_none());
    }
}
