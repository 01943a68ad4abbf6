//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive scoping this level to the portal crates.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "portal=trace,portal_ai=trace,portal_config=trace",
            LogLevel::Debug => "portal=debug,portal_ai=debug,portal_config=debug",
            LogLevel::Info => "portal=info,portal_ai=info,portal_config=info",
            LogLevel::Warn => "portal=warn,portal_ai=warn,portal_config=warn",
            LogLevel::Error => "portal=error,portal_ai=error,portal_config=error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
