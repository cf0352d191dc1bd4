//! Certificate Gateway
//!
//! Authenticates inbound requests and forwards them to the execution engine.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cert_gateway::{
    cli::{Cli, Command},
    config::Config,
    engine::HttpEngine,
    gateway::Gateway,
    settings::RequestSettings,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::CheckHeaders) => check_headers(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> cert_gateway::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    Ok(config)
}

/// Print the effective identity settings
fn check_headers(config: &Config) -> ExitCode {
    let settings = RequestSettings::from_config(config);
    let mode = if settings.allow_header_cert_info {
        "headers"
    } else {
        "tls"
    };
    println!("Trust source:       {mode}");
    println!(
        "DN header:          {}",
        settings.ssl_client_header.as_deref().unwrap_or("(none)")
    );
    println!(
        "Verify header:      {}",
        settings.ssl_client_verify_header.as_deref().unwrap_or("(none)")
    );
    println!("Certificate header: {}", cert_gateway::identity::CLIENT_CERT_HEADER);
    ExitCode::SUCCESS
}

/// Run the gateway server
async fn run_server(config: Config) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        header_trust = config.authorization.allow_header_cert_info,
        "Starting certificate gateway"
    );

    let engine = match HttpEngine::from_config(&config.engine) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to create engine client: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = Gateway::new(config, engine).run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
