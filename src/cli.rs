//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Certificate gateway - authenticates clients and forwards canonical requests
/// to the execution engine
#[derive(Parser, Debug)]
#[command(name = "cert-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CERT_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CERT_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "CERT_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CERT_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CERT_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Print the trust mode and identity header names derived from the config
    CheckHeaders,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_server_mode() {
        let cli = Cli::try_parse_from(["cert-gateway"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(cli.port.is_none());
    }

    #[test]
    fn parses_overrides_and_subcommand() {
        let cli = Cli::try_parse_from([
            "cert-gateway",
            "--port",
            "9140",
            "--host",
            "0.0.0.0",
            "check-headers",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(9140));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        assert_eq!(cli.command, Some(Command::CheckHeaders));
    }
}
