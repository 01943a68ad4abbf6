//! Incremental reply delivery.
//!
//! Two ways of producing chunks: slicing a finished reply into fixed-size
//! pieces with a short pause in between, or parsing an upstream
//! Server-Sent Events stream as it arrives.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::AiError;

/// Characters per simulated chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10;
/// Pause between simulated chunks.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(10);

const DONE_SENTINEL: &str = "[DONE]";

/// Split `text` into pieces of at most `chunk_size` characters.
///
/// Never splits inside a UTF-8 code point. An empty string yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % chunk_size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Hand `text` to `on_chunk` slice by slice, pausing `delay` between slices.
pub async fn deliver_chunks(
    text: &str,
    chunk_size: usize,
    delay: Duration,
    on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
) {
    for (i, chunk) in chunk_text(text, chunk_size).into_iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        on_chunk(chunk);
    }
}

/// The in-band marker a streaming caller receives instead of an error.
pub fn error_chunk(err: &AiError) -> String {
    format!("Error: {err}")
}

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone)]
pub struct SseEvent {
    /// The event type, if the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data (JSON string).
    pub data: String,
}

/// Parse an SSE stream from a reqwest response, calling `on_event` for each event.
///
/// Stops at the `[DONE]` sentinel or at the first error returned by `on_event`.
pub async fn parse_sse_stream(
    response: reqwest::Response,
    mut on_event: impl FnMut(SseEvent) -> Result<(), AiError>,
) -> Result<(), AiError> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    let mut lines = reader.lines();

    let mut current_event: Option<String> = None;
    let mut current_data = String::new();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AiError::UpstreamUnavailable(format!("stream interrupted: {e}")))?
    {
        if line.is_empty() {
            // Empty line = end of event
            if !current_data.is_empty() {
                if current_data == DONE_SENTINEL {
                    return Ok(());
                }
                on_event(SseEvent {
                    event: current_event.take(),
                    data: std::mem::take(&mut current_data),
                })?;
            }
            current_event = None;
            continue;
        }

        if let Some(event_type) = field_value(&line, "event:") {
            current_event = Some(event_type.to_string());
        } else if let Some(data) = field_value(&line, "data:") {
            if !current_data.is_empty() {
                current_data.push('\n');
            }
            current_data.push_str(data);
        }
        // Ignore other fields (id:, retry:, comments)
    }

    // Flush any remaining event
    if !current_data.is_empty() && current_data != DONE_SENTINEL {
        on_event(SseEvent {
            event: current_event,
            data: current_data,
        })?;
    }

    Ok(())
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    line.strip_prefix(field)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}
