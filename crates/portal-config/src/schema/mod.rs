//! Configuration schema types for Portal.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the service has always used.

mod llm;
mod sessions;
mod system;

pub use llm::*;
pub use sessions::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Portal.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PortalConfig {
    pub llm: LlmConfig,
    pub sessions: SessionsConfig,
    pub logging: LoggingConfig,
}
