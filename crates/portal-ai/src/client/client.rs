//! Inference client struct, request building, and response parsing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{AiError, GenerationParams, Message};

use super::config::InferenceConfig;
use super::wire::{ChatCompletionRequest, ChatCompletionResponse, ExtraBody};

pub(crate) const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_PREVIEW: usize = 200;

/// Chat completion client for one upstream server.
pub struct InferenceClient {
    pub(crate) config: InferenceConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) available: AtomicBool,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout.min(CONNECT_TIMEOUT))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Client(e.to_string()))?;

        Ok(Self {
            config,
            http,
            available: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Result of the last `probe`. False until a probe has succeeded.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}{COMPLETIONS_PATH}", self.config.server_url)
    }

    /// Build the request body, filling unset parameters from the config.
    pub(crate) fn build_request_body<'a>(
        &'a self,
        messages: &'a [Message],
        params: &'a GenerationParams,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: params.model.as_deref().unwrap_or(&self.config.model),
            messages,
            temperature: params.temperature.unwrap_or(self.config.temperature),
            top_p: params.top_p.unwrap_or(self.config.top_p),
            max_tokens: params.max_tokens.unwrap_or(self.config.max_tokens),
            stream,
            extra_body: ExtraBody {
                enable_thinking: !self.config.skip_thinking,
            },
        }
    }

    /// Map a transport failure onto the error taxonomy.
    pub(crate) fn transport_error(&self, err: reqwest::Error) -> AiError {
        if err.is_timeout() {
            AiError::UpstreamUnavailable(format!(
                "request to {} timed out",
                self.config.server_url
            ))
        } else if err.is_decode() {
            AiError::InvalidUpstreamResponse(err.to_string())
        } else {
            AiError::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Extract `choices[0].message.content` from a completion body.
pub(crate) fn parse_response(body: &str) -> Result<String, AiError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AiError::InvalidUpstreamResponse(format!("JSON parse error: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::InvalidUpstreamResponse("response has no choices".into()))?;

    choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| {
            AiError::InvalidUpstreamResponse("choices[0].message.content is missing".into())
        })
}

/// Error for a non-success HTTP status, keeping a short body preview.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    AiError::InvalidUpstreamResponse(format!("HTTP {status}: {preview}"))
}
