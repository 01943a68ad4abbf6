//! Interactive chat loop over stdin.

use std::io::Write;

use portal_ai::{AiError, GenerationParams};
use portal_common::PortalError;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::stream_turn;
use crate::service::Service;

const HELP: &str = "commands: /history  /clear  /info  /quit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    History,
    Clear,
    Info,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line {
        "/history" => Input::History,
        "/clear" => Input::Clear,
        "/info" => Input::Info,
        "/quit" | "/exit" => Input::Quit,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        text => Input::Message(text),
    }
}

pub async fn chat(
    service: &Service,
    session_id: &str,
    system_prompt: &str,
) -> Result<(), PortalError> {
    let params = GenerationParams::default();
    service.sessions().open_session(session_id, system_prompt).await;

    println!("session {session_id}");
    if !service.client().is_available() {
        println!("warning: upstream did not answer the startup probe");
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::History => print_history(service, session_id).await,
            Input::Info => print_info(service, session_id).await,
            Input::Clear => {
                service.sessions().clear_session(session_id).await;
                service.sessions().open_session(session_id, system_prompt).await;
                println!("history cleared");
            }
            Input::Unknown(cmd) => println!("unknown command {cmd}. {HELP}"),
            Input::Message(text) => {
                stream_turn(service, session_id, system_prompt, text, &params).await?;
            }
        }
    }

    tracing::debug!(session_id, "chat ended");
    Ok(())
}

async fn print_history(service: &Service, session_id: &str) {
    match service.sessions().get_history(session_id).await {
        Ok(history) => {
            for message in history {
                println!("[{}] {}", message.role.as_str(), message.content);
            }
        }
        Err(AiError::NotFound(_)) => println!("(no history)"),
        Err(e) => println!("error: {e}"),
    }
}

async fn print_info(service: &Service, session_id: &str) {
    match service.sessions().session_info(session_id).await {
        Ok(info) => {
            println!("session:   {}", info.session_id);
            println!("messages:  {}", info.message_count);
            println!("turns:     {}", info.turn_count);
            println!("~tokens:   {}", info.approx_tokens);
            println!("age:       {}s", info.age.as_secs());
            println!("idle:      {}s", info.idle.as_secs());
        }
        Err(AiError::NotFound(_)) => println!("(no session)"),
        Err(e) => println!("error: {e}"),
    }
}
