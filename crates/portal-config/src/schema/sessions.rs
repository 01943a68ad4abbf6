//! Conversation session cache configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// User/assistant pairs remembered per session, besides the system prompt.
    pub max_history: u32,
    /// Run turns of the same session one at a time.
    pub serialize_turns: bool,
    /// Evict sessions idle for this many seconds. 0 keeps them until cleared.
    pub idle_timeout_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            serialize_turns: false,
            idle_timeout_secs: 0,
        }
    }
}
