//! Multi-turn conversations on top of a stateless completion backend.

use std::sync::Arc;
use std::time::Duration;

use portal_config::SessionsConfig;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::{AiError, GenerationParams, InferenceBackend, Message};

use super::store::SessionStore;
use super::types::SessionInfo;

/// Runs conversation turns against a backend, keeping history per session.
///
/// Each turn snapshots the dialog under the store lock, calls the backend
/// with no lock held, then re-locks to record the reply. Turns on different
/// sessions never wait on each other's network latency.
pub struct SessionManager {
    backend: Arc<dyn InferenceBackend>,
    pub(super) store: SessionStore,
    /// User/assistant pairs kept besides the system prompt.
    max_history: usize,
    /// Hold the session's turn gate for the whole turn.
    serialize_turns: bool,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: &SessionsConfig) -> Self {
        info!(
            max_history = config.max_history,
            serialize_turns = config.serialize_turns,
            "session manager initialized"
        );
        Self {
            backend,
            store: SessionStore::new(),
            max_history: config.max_history as usize,
            serialize_turns: config.serialize_turns,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_serialized_turns(mut self, serialize: bool) -> Self {
        self.serialize_turns = serialize;
        self
    }

    /// Run one turn and return the assistant reply.
    ///
    /// If the session is cleared while the reply is being generated, the
    /// reply is still returned but not recorded.
    pub async fn process_message(
        &self,
        session_id: &str,
        system_prompt: &str,
        user_message: &str,
        params: &GenerationParams,
    ) -> Result<String, AiError> {
        let turn = self.acquire_turn(session_id).await;
        let snapshot = self
            .store
            .begin_turn(session_id, system_prompt, user_message, self.max_history)
            .await;

        let result = self.backend.generate(&snapshot, params).await;
        if let Ok(reply) = &result {
            self.record_reply(session_id, reply).await;
        }

        self.end_turn(session_id, turn).await;
        result
    }

    /// Run one turn, handing the reply to `on_chunk` as it is produced.
    ///
    /// Never fails: an upstream error arrives as a final `Error: ...` chunk
    /// and nothing is recorded for the turn.
    pub async fn process_message_stream(
        &self,
        session_id: &str,
        system_prompt: &str,
        user_message: &str,
        mut on_chunk: impl FnMut(&str) + Send,
        params: &GenerationParams,
    ) {
        let turn = self.acquire_turn(session_id).await;
        let snapshot = self
            .store
            .begin_turn(session_id, system_prompt, user_message, self.max_history)
            .await;

        match self
            .backend
            .generate_stream(&snapshot, params, &mut on_chunk)
            .await
        {
            Ok(reply) => self.record_reply(session_id, &reply).await,
            Err(e) => warn!(session_id, error = %e, "streamed turn failed, nothing recorded"),
        }

        self.end_turn(session_id, turn).await;
    }

    /// Create the session without running a turn.
    pub async fn open_session(&self, session_id: &str, system_prompt: &str) {
        self.store.open(session_id, system_prompt).await;
    }

    /// Snapshot of the session's dialog, system directive first.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Message>, AiError> {
        self.store
            .history(session_id)
            .await
            .ok_or_else(|| AiError::NotFound(session_id.to_string()))
    }

    /// Forget a session. Clearing an unknown id is a no-op.
    pub async fn clear_session(&self, session_id: &str) {
        if self.store.remove(session_id).await {
            info!(session_id, "cleared session");
        } else {
            debug!(session_id, "clear requested for unknown session");
        }
    }

    pub async fn session_info(&self, session_id: &str) -> Result<SessionInfo, AiError> {
        self.store
            .info(session_id)
            .await
            .ok_or_else(|| AiError::NotFound(session_id.to_string()))
    }

    pub async fn session_count(&self) -> usize {
        self.store.count().await
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.store.ids().await
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        self.store.evict_idle(max_idle).await
    }

    async fn acquire_turn(&self, session_id: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.serialize_turns {
            return None;
        }
        let gate = self.store.turn_gate(session_id).await;
        Some(gate.lock_owned().await)
    }

    async fn end_turn(&self, session_id: &str, turn: Option<OwnedMutexGuard<()>>) {
        if let Some(guard) = turn {
            drop(guard);
            self.store.release_gate(session_id).await;
        }
    }

    async fn record_reply(&self, session_id: &str, reply: &str) {
        let recorded = self
            .store
            .finish_turn(session_id, reply, self.max_history)
            .await;
        if !recorded {
            debug!(session_id, "session cleared during generation, reply dropped");
        }
    }
}
