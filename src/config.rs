//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CERT_GATEWAY_";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Client identity (trust source) configuration
    pub authorization: AuthorizationConfig,
    /// Execution engine configuration
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size (bytes)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8140,
            max_body_bytes: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Client identity configuration.
///
/// The two header settings hold *raw* names in CGI-variable style
/// (`HTTP_X_CLIENT_DN`); see [`crate::settings::header_name`] for how they
/// are turned into HTTP header names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Trust identity headers set by an upstream TLS terminator instead of
    /// the TLS peer certificate.
    pub allow_header_cert_info: bool,
    /// Raw name of the header carrying the client DN
    pub ssl_client_header: Option<String>,
    /// Raw name of the header carrying the verification result
    pub ssl_client_verify_header: Option<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            allow_header_cert_info: false,
            ssl_client_header: Some("HTTP_X_CLIENT_DN".to_string()),
            ssl_client_verify_header: Some("HTTP_X_CLIENT_VERIFY".to_string()),
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Endpoint receiving canonical requests as JSON
    pub url: String,
    /// Upstream request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8141/engine".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // e.g. CERT_GATEWAY_AUTHORIZATION__ALLOW_HEADER_CERT_INFO=true
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_trusts_tls_only() {
        let config = Config::default();
        assert!(!config.authorization.allow_header_cert_info);
        assert_eq!(
            config.authorization.ssl_client_header.as_deref(),
            Some("HTTP_X_CLIENT_DN")
        );
        assert_eq!(
            config.authorization.ssl_client_verify_header.as_deref(),
            Some("HTTP_X_CLIENT_VERIFY")
        );
    }

    #[test]
    fn test_authorization_deserialized_from_yaml() {
        let yaml = r#"
authorization:
  allow_header_cert_info: true
  ssl_client_header: puppet_ssl_client_header
  ssl_client_verify_header: x_ssl_client_verify_header
engine:
  url: "http://engine.internal:9000/run"
  timeout: "30s"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.authorization.allow_header_cert_info);
        assert_eq!(
            config.authorization.ssl_client_header.as_deref(),
            Some("puppet_ssl_client_header")
        );
        assert_eq!(config.engine.url, "http://engine.internal:9000/run");
        assert_eq!(config.engine.timeout, Duration::from_secs(30));
        // untouched sections keep defaults
        assert_eq!(config.server.port, 8140);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "server:\n  host: \"0.0.0.0\"\n  port: 18140").unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 18140);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/gateway.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_humantime_units() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "humantime_serde")]
            d: Duration,
        }
        let parse = |s: &str| serde_yaml::from_str::<Wrapper>(&format!("d: \"{s}\"")).unwrap().d;
        assert_eq!(parse("100ms"), Duration::from_millis(100));
        assert_eq!(parse("45s"), Duration::from_secs(45));
        assert_eq!(parse("2m"), Duration::from_secs(120));
        assert_eq!(parse("7"), Duration::from_secs(7));
    }
}
