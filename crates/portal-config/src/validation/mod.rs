//! Full configuration validation.
//!
//! Validates numeric ranges and the upstream URL. Each section has its
//! own submodule; this orchestrator calls them all and collects errors
//! into a single `ConfigError`.

mod helpers;
mod llm;
mod sessions;


use crate::schema::PortalConfig;
use portal_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PortalConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    llm::validate_llm(&mut errors, config);
    sessions::validate_sessions(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
