//! One-shot commands: `probe` and `ask`.

use std::io::Write;
use std::process::ExitCode;

use portal_ai::{GenerationParams, Role};
use portal_common::PortalError;

use crate::service::Service;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub fn probe(service: &Service) -> ExitCode {
    let config = service.client().config();
    if service.client().is_available() {
        println!("{} is available (model: {})", config.server_url, config.model);
        ExitCode::SUCCESS
    } else {
        println!("{} is not available", config.server_url);
        ExitCode::FAILURE
    }
}

pub async fn ask(
    service: &Service,
    session_id: &str,
    system_prompt: &str,
    stream: bool,
    message: &str,
) -> Result<ExitCode, PortalError> {
    let params = GenerationParams::default();

    if !stream {
        let reply = service
            .sessions()
            .process_message(session_id, system_prompt, message, &params)
            .await?;
        println!("{reply}");
        return Ok(ExitCode::SUCCESS);
    }

    stream_turn(service, session_id, system_prompt, message, &params).await?;
    if last_turn_answered(service, session_id).await {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Stream one turn to stdout, ending with a newline.
pub async fn stream_turn(
    service: &Service,
    session_id: &str,
    system_prompt: &str,
    message: &str,
    params: &GenerationParams,
) -> Result<(), PortalError> {
    let mut stdout = std::io::stdout();
    let mut write_failed = false;

    service
        .sessions()
        .process_message_stream(
            session_id,
            system_prompt,
            message,
            |chunk: &str| {
                if write_failed {
                    return;
                }
                if stdout.write_all(chunk.as_bytes()).and_then(|_| stdout.flush()).is_err() {
                    write_failed = true;
                }
            },
            params,
        )
        .await;

    writeln!(stdout)?;
    Ok(())
}

/// A streamed turn reports failures in-band; the history tells whether a
/// reply was recorded.
async fn last_turn_answered(service: &Service, session_id: &str) -> bool {
    service
        .sessions()
        .get_history(session_id)
        .await
        .ok()
        .and_then(|history| history.last().map(|m| m.role == Role::Assistant))
        .unwrap_or(false)
}
