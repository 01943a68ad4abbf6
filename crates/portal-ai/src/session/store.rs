//! Session store: maps session ids to conversation state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

use crate::Message;

use super::types::{ConversationState, SessionInfo};

/// Thread-safe session store.
///
/// One lock covers lookup, insert and erase. Every method holds it only
/// for in-memory work; nothing here awaits anything but the lock itself.
///
/// Turn gates live in their own map keyed by session id so that a gate
/// outlives a clear while any turn still holds or waits on it. A turn
/// that recreates the session then queues on the same gate.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
    turn_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session if it does not exist yet. An existing session
    /// keeps its original system prompt.
    pub async fn open(&self, session_id: &str, system_prompt: &str) {
        let mut map = self.sessions.lock().await;
        get_or_create(&mut map, session_id, system_prompt).touch();
    }

    /// Append the user message, trim, and return a snapshot to send upstream.
    pub(crate) async fn begin_turn(
        &self,
        session_id: &str,
        system_prompt: &str,
        user_message: &str,
        max_history: usize,
    ) -> Vec<Message> {
        let mut map = self.sessions.lock().await;
        let state = get_or_create(&mut map, session_id, system_prompt);
        state.push_user(user_message);
        state.trim(max_history);
        state.touch();
        state.dialog.clone()
    }

    /// Record the assistant reply and trim again. Returns false if the
    /// session was cleared while the reply was being generated.
    pub(crate) async fn finish_turn(
        &self,
        session_id: &str,
        reply: &str,
        max_history: usize,
    ) -> bool {
        let mut map = self.sessions.lock().await;
        match map.get_mut(session_id) {
            Some(state) => {
                state.push_assistant(reply);
                state.trim(max_history);
                true
            }
            None => false,
        }
    }

    /// The turn gate for `session_id`, shared by every turn on that id.
    pub(crate) async fn turn_gate(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.turn_gates.lock().await;
        Arc::clone(gates.entry(session_id.to_string()).or_default())
    }

    pub async fn history(&self, session_id: &str) -> Option<Vec<Message>> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|state| state.dialog.clone())
    }

    pub async fn info(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|state| state.info(session_id))
    }

    /// Remove a session. Returns true if it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(session_id).is_some();
        self.release_gate(session_id).await;
        removed
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Ids of all live sessions, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop sessions not touched for longer than `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.sessions.lock().await;
        let now = Instant::now();
        let mut evicted = Vec::new();
        map.retain(|id, state| {
            let idle = now.duration_since(state.last_access) > max_idle;
            if idle {
                info!(session_id = %id, "evicting idle session");
                evicted.push(id.clone());
            }
            !idle
        });
        drop(map);

        for id in &evicted {
            self.release_gate(id).await;
        }
        evicted.len()
    }

    /// Drop the turn gate of a session that no longer exists, once no
    /// turn holds or waits on it.
    pub(crate) async fn release_gate(&self, session_id: &str) {
        let mut gates = self.turn_gates.lock().await;
        let unused = gates
            .get(session_id)
            .is_some_and(|gate| Arc::strong_count(gate) == 1);
        if unused && !self.sessions.lock().await.contains_key(session_id) {
            gates.remove(session_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn gate_count(&self) -> usize {
        self.turn_gates.lock().await.len()
    }
}

fn get_or_create<'a>(
    map: &'a mut HashMap<String, ConversationState>,
    session_id: &str,
    system_prompt: &str,
) -> &'a mut ConversationState {
    map.entry(session_id.to_string()).or_insert_with(|| {
        info!(session_id, "created session");
        ConversationState::new(system_prompt)
    })
}
