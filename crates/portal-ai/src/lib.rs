//! Inference proxy and conversation session cache for Portal.
//!
//! Provides:
//! - An OpenAI-compatible chat completion client with simulated or
//!   Server-Sent-Events streaming
//! - A session cache that turns the stateless completion API into
//!   multi-turn conversations without holding locks across network calls
//! - History trimming that always keeps the system directive

pub mod client;
pub mod session;
pub mod streaming;

use async_trait::async_trait;

pub use client::{InferenceClient, InferenceConfig};
pub use session::{SessionInfo, SessionManager, SessionStore};

/// A chat completion backend.
///
/// `InferenceClient` is the HTTP implementation; anything else (test
/// doubles, local models) can stand in for it behind `SessionManager`.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, AiError>;

    /// Deliver the reply through `on_chunk`, in order, and return it whole.
    ///
    /// A failure is reported to `on_chunk` as one final `Error: ...` chunk
    /// before the error is returned.
    async fn generate_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, AiError> {
        match self.generate(messages, params).await {
            Ok(text) => {
                streaming::deliver_chunks(
                    &text,
                    streaming::DEFAULT_CHUNK_SIZE,
                    streaming::DEFAULT_CHUNK_DELAY,
                    on_chunk,
                )
                .await;
                Ok(text)
            }
            Err(e) => {
                on_chunk(&streaming::error_chunk(&e));
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Per-call sampling overrides. `None` falls back to the client defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

impl GenerationParams {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("http client error: {0}")]
    Client(String),
}

impl AiError {
    /// Whether retrying the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::UpstreamUnavailable(_))
    }
}

impl From<AiError> for portal_common::PortalError {
    fn from(err: AiError) -> Self {
        portal_common::PortalError::Inference(err.to_string())
    }
}

/// Rough token count (about four characters per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}
