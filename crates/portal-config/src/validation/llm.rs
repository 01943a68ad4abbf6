//! Upstream inference settings validation.

use crate::schema::PortalConfig;

use super::helpers::{validate_range, validate_range_f64};

pub(crate) fn validate_llm(errors: &mut Vec<String>, config: &PortalConfig) {
    let llm = &config.llm;

    if !(llm.server_url.starts_with("http://") || llm.server_url.starts_with("https://")) {
        errors.push(format!(
            "llm.server_url = {:?} must start with http:// or https://",
            llm.server_url
        ));
    }
    if llm.model.trim().is_empty() {
        errors.push("llm.model must not be empty".into());
    }

    validate_range(errors, "llm.timeout", llm.timeout, 1, 3600);
    validate_range(errors, "llm.probe_timeout", llm.probe_timeout, 1, 120);
    validate_range_f64(errors, "llm.temperature", llm.temperature, 0.0, 2.0);
    validate_range_f64(errors, "llm.top_p", llm.top_p, 0.0, 1.0);
    validate_range(errors, "llm.max_tokens", u64::from(llm.max_tokens), 1, 131_072);
    validate_range(errors, "llm.chunk_size", u64::from(llm.chunk_size), 1, 4096);
    validate_range(errors, "llm.chunk_delay_ms", llm.chunk_delay_ms, 0, 1000);
}
