mod cli;
mod commands;
mod repl;
mod service;

use std::process::ExitCode;

use portal_common::PortalError;
use portal_config::{LogLevel, PortalConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};
use crate::commands::DEFAULT_SYSTEM_PROMPT;
use crate::service::Service;

/// Map a bare level name onto the portal crates; pass anything else through
/// as a raw filter directive.
fn level_directive(level: &str) -> String {
    let parsed = match level.to_ascii_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    };
    parsed.map_or_else(|| level.to_string(), |l| l.directive().to_string())
}

/// `--log-level` wins, then `RUST_LOG`, then the config file.
fn init_logging(cli_level: Option<&str>, config_level: LogLevel) {
    let fallback = || EnvFilter::new(config_level.directive());
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level_directive(level)).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<PortalConfig, portal_common::ConfigError> {
    match &args.config {
        Some(path) => portal_config::load_config_from(path),
        None => portal_config::load_config(),
    }
}

async fn run(command: Command, config: &PortalConfig) -> Result<ExitCode, PortalError> {
    let service = Service::start(config).await?;

    match command {
        Command::Probe => Ok(commands::probe(&service)),
        Command::Ask {
            session,
            system,
            stream,
            message,
        } => {
            let session_id = session.unwrap_or_else(portal_common::new_session_id);
            let system = system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
            commands::ask(&service, &session_id, system, stream, &message).await
        }
        Command::Chat { session, system } => {
            let session_id = session.unwrap_or_else(portal_common::new_session_id);
            let system = system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
            repl::chat(&service, &session_id, system).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let loaded = load_config(&args);
    let config_level = loaded
        .as_ref()
        .map(|c| c.logging.level)
        .unwrap_or_default();
    init_logging(args.log_level.as_deref(), config_level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            tracing::error!("Config load failed: {e}");
            return ExitCode::from(2);
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            let mut config = PortalConfig::default();
            portal_config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config
        }
    };

    tracing::info!(
        server_url = %config.llm.server_url,
        model = %config.llm.model,
        "portal v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match run(args.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
