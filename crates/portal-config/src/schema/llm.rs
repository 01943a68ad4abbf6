//! Upstream inference server configuration.

use serde::{Deserialize, Serialize};

/// How streamed replies are produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum StreamMode {
    /// Fetch the whole completion, then hand it out in fixed-size slices.
    #[default]
    Simulated,
    /// Consume the upstream's `stream: true` Server-Sent Events.
    Sse,
}

/// OpenAI-compatible chat completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; `/v1/chat/completions` is appended.
    pub server_url: String,
    pub model: String,
    /// Per-request budget in seconds (valid range: 1-3600).
    pub timeout: u64,
    /// Budget for the startup probe in seconds (valid range: 1-120).
    pub probe_timeout: u64,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    /// Sends `extra_body.enable_thinking = false` when set.
    pub skip_thinking: bool,
    pub stream_mode: StreamMode,
    /// Characters per simulated chunk.
    pub chunk_size: u32,
    /// Pause between simulated chunks, in milliseconds.
    pub chunk_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            model: "default".into(),
            timeout: 300,
            probe_timeout: 10,
            temperature: 0.6,
            top_p: 0.9,
            max_tokens: 4096,
            skip_thinking: true,
            stream_mode: StreamMode::Simulated,
            chunk_size: 10,
            chunk_delay_ms: 10,
        }
    }
}
