//! Per-session conversation state and the history trimming policy.

use std::time::{Duration, Instant};

use crate::{estimate_tokens, Message, Role};

/// Everything the cache remembers about one conversation.
pub(crate) struct ConversationState {
    /// Ordered history. Index 0 is the system directive.
    pub(crate) dialog: Vec<Message>,
    pub(crate) created_at: Instant,
    pub(crate) last_access: Instant,
    /// User messages processed so far.
    pub(crate) turn_count: u64,
}

impl ConversationState {
    pub(crate) fn new(system_prompt: &str) -> Self {
        let now = Instant::now();
        Self {
            dialog: vec![Message::system(system_prompt)],
            created_at: now,
            last_access: now,
            turn_count: 0,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    pub(crate) fn push_user(&mut self, content: &str) {
        self.dialog.push(Message::user(content));
        self.turn_count += 1;
    }

    pub(crate) fn push_assistant(&mut self, content: &str) {
        self.dialog.push(Message::assistant(content));
    }

    /// Keep the system message plus the last `2 * max_history` entries.
    ///
    /// A raw suffix cut: it does not realign on user/assistant boundaries.
    pub(crate) fn trim(&mut self, max_history: usize) {
        if self.dialog.first().map(|m| m.role) != Some(Role::System) {
            return;
        }
        let keep = max_history.saturating_mul(2);
        let non_system = self.dialog.len() - 1;
        if non_system > keep {
            let cut_end = self.dialog.len() - keep;
            self.dialog.drain(1..cut_end);
        }
    }

    pub(crate) fn info(&self, session_id: &str) -> SessionInfo {
        SessionInfo {
            session_id: session_id.to_string(),
            message_count: self.dialog.len(),
            turn_count: self.turn_count,
            age: self.created_at.elapsed(),
            idle: self.last_access.elapsed(),
            approx_tokens: self.dialog.iter().map(|m| estimate_tokens(&m.content)).sum(),
        }
    }
}

/// Read-only summary of a session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    /// Messages currently held, system directive included.
    pub message_count: usize,
    pub turn_count: u64,
    pub age: Duration,
    /// Time since the session was last touched by a turn.
    pub idle: Duration,
    pub approx_tokens: usize,
}
