//! Portal configuration system.
//!
//! Provides TOML-based configuration for the upstream inference server,
//! the session cache, and logging. All config sections use sensible
//! defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use portal_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    LlmConfig, LogLevel, LoggingConfig, PortalConfig, SessionsConfig, StreamMode,
    CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use portal_common::ConfigError;

/// Overrides the configured upstream URL.
pub const ENV_SERVER_URL: &str = "PORTAL_LLM_SERVER_URL";
/// Overrides the configured model name.
pub const ENV_MODEL: &str = "PORTAL_LLM_MODEL";

/// Load config from the platform default path.
///
/// Creates a default `config.toml` if none exists, then applies environment
/// overrides. Out-of-range values only produce a warning at load time.
pub fn load_config() -> Result<PortalConfig, ConfigError> {
    let mut config = toml_loader::load_default()?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Load config from an explicit file path, then apply environment overrides.
pub fn load_config_from(path: &Path) -> Result<PortalConfig, ConfigError> {
    let mut config = toml_loader::load_from_path(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply `PORTAL_LLM_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides(config: &mut PortalConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
        tracing::debug!(server_url = %url, "server_url overridden from environment");
        config.llm.server_url = url.trim().to_string();
    }
    if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
        tracing::debug!(model = %model, "model overridden from environment");
        config.llm.model = model.trim().to_string();
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &PortalConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
