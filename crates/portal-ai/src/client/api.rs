//! InferenceBackend implementation for InferenceClient (generate + streaming),
//! plus the startup connection probe.

use std::sync::atomic::Ordering;
use std::time::Instant;

use async_trait::async_trait;
use portal_common::new_correlation_id;
use portal_config::StreamMode;
use tracing::{debug, info, warn};

use crate::streaming::{deliver_chunks, error_chunk, parse_sse_stream, SseEvent};
use crate::{AiError, GenerationParams, InferenceBackend, Message};

use super::client::{parse_response, status_error, InferenceClient};
use super::wire::{ChatCompletionChunk, ChatCompletionResponse, ProbeRequest};

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn generate(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, AiError> {
        let cid = new_correlation_id();
        let body = self.build_request_body(messages, params, false);
        debug!(cid = %cid, model = %body.model, messages = messages.len(), "chat completion request");

        let start = Instant::now();
        let response = self
            .http
            .post(self.completions_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let content = parse_response(&text)?;
        info!(
            cid = %cid,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "generated response"
        );
        Ok(content)
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, AiError> {
        let result = match self.config.stream_mode {
            StreamMode::Simulated => match self.generate(messages, params).await {
                Ok(text) => {
                    deliver_chunks(
                        &text,
                        self.config.chunk_size,
                        self.config.chunk_delay,
                        on_chunk,
                    )
                    .await;
                    Ok(text)
                }
                Err(e) => Err(e),
            },
            StreamMode::Sse => self.stream_events(messages, params, on_chunk).await,
        };

        if let Err(ref e) = result {
            warn!(error = %e, "streamed generation failed");
            on_chunk(&error_chunk(e));
        }
        result
    }
}

impl InferenceClient {
    /// Send a one-token completion and report whether a well-formed reply came back.
    pub async fn test_connection(&self) -> bool {
        info!(server = %self.config.server_url, "testing connection to inference server");

        let body = ProbeRequest {
            model: &self.config.model,
            messages: [Message::system("test")],
            max_tokens: 1,
        };

        let response = match self
            .http
            .post(self.completions_url())
            .timeout(self.config.probe_timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "connection test failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "connection test failed: upstream returned an error status");
            return false;
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(parsed) if !parsed.choices.is_empty() => {
                info!("connection test successful");
                true
            }
            Ok(_) => {
                warn!("connection test failed: response has no choices");
                false
            }
            Err(e) => {
                warn!(error = %e, "connection test failed: unreadable response");
                false
            }
        }
    }

    /// Run `test_connection` once and remember the outcome in `is_available`.
    pub async fn probe(&self) -> bool {
        let available = self.test_connection().await;
        self.available.store(available, Ordering::Release);
        available
    }

    /// Forward upstream SSE deltas to `on_chunk` as they arrive.
    async fn stream_events(
        &self,
        messages: &[Message],
        params: &GenerationParams,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, AiError> {
        let cid = new_correlation_id();
        let body = self.build_request_body(messages, params, true);
        debug!(cid = %cid, model = %body.model, messages = messages.len(), "streaming chat completion request");

        let start = Instant::now();
        let response = self
            .http
            .post(self.completions_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let mut full_content = String::new();
        parse_sse_stream(response, |event: SseEvent| {
            match event.event.as_deref() {
                None | Some("message") => {}
                Some("error") => {
                    return Err(AiError::InvalidUpstreamResponse(format!(
                        "upstream stream error: {}",
                        event.data
                    )));
                }
                Some(other) => {
                    debug!(cid = %cid, event = other, "skipping stream event");
                    return Ok(());
                }
            }

            let chunk: ChatCompletionChunk = serde_json::from_str(&event.data).map_err(|e| {
                AiError::InvalidUpstreamResponse(format!("malformed stream event: {e}"))
            })?;

            if let Some(text) = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
            {
                if !text.is_empty() {
                    full_content.push_str(&text);
                    on_chunk(&text);
                }
            }
            Ok(())
        })
        .await?;

        info!(
            cid = %cid,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = full_content.len(),
            "streamed response"
        );
        Ok(full_content)
    }
}
