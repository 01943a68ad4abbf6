//! Inference client configuration.

use std::time::Duration;

use portal_config::{LlmConfig, StreamMode};

/// Inference client configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL without the `/v1/chat/completions` suffix.
    pub server_url: String,
    pub model: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub skip_thinking: bool,
    pub stream_mode: StreamMode,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl InferenceConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: normalize_url(server_url.into()),
            model: "default".to_string(),
            timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(10),
            temperature: 0.6,
            top_p: 0.9,
            max_tokens: 4096,
            skip_thinking: true,
            stream_mode: StreamMode::Simulated,
            chunk_size: crate::streaming::DEFAULT_CHUNK_SIZE,
            chunk_delay: crate::streaming::DEFAULT_CHUNK_DELAY,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_stream_mode(mut self, mode: StreamMode) -> Self {
        self.stream_mode = mode;
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = delay;
        self
    }
}

impl From<&LlmConfig> for InferenceConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            server_url: normalize_url(llm.server_url.clone()),
            model: llm.model.clone(),
            timeout: Duration::from_secs(llm.timeout),
            probe_timeout: Duration::from_secs(llm.probe_timeout),
            temperature: llm.temperature,
            top_p: llm.top_p,
            max_tokens: llm.max_tokens,
            skip_thinking: llm.skip_thinking,
            stream_mode: llm.stream_mode,
            chunk_size: (llm.chunk_size as usize).max(1),
            chunk_delay: Duration::from_millis(llm.chunk_delay_ms),
        }
    }
}

fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
