//! Session cache settings validation.

use crate::schema::PortalConfig;

use super::helpers::validate_range;

pub(crate) fn validate_sessions(errors: &mut Vec<String>, config: &PortalConfig) {
    validate_range(
        errors,
        "sessions.max_history",
        u64::from(config.sessions.max_history),
        1,
        1000,
    );
}
