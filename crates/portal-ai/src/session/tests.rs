//! Session manager behavior against in-process backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use portal_config::SessionsConfig;
use tokio::sync::Notify;

use super::*;
use crate::{AiError, GenerationParams, InferenceBackend, Message, Role};

/// Replies with a fixed string.
struct FixedBackend(&'static str);

#[async_trait]
impl InferenceBackend for FixedBackend {
    async fn generate(&self, _: &[Message], _: &GenerationParams) -> Result<String, AiError> {
        Ok(self.0.to_string())
    }
}

/// Replies with the last user message, after an optional delay.
#[derive(Default)]
struct EchoBackend {
    delay: Duration,
    calls: AtomicUsize,
}

impl EchoBackend {
    fn delayed(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl InferenceBackend for EchoBackend {
    async fn generate(
        &self,
        messages: &[Message],
        _: &GenerationParams,
    ) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("echo: {last_user} ({} messages seen)", messages.len()))
    }
}

/// Signals when a call starts and waits to be released.
#[derive(Default)]
struct GatedBackend {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl InferenceBackend for GatedBackend {
    async fn generate(&self, _: &[Message], _: &GenerationParams) -> Result<String, AiError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("late reply".to_string())
    }
}

/// Records how many calls overlap.
#[derive(Default)]
struct OverlapBackend {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl InferenceBackend for OverlapBackend {
    async fn generate(&self, _: &[Message], _: &GenerationParams) -> Result<String, AiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("done".to_string())
    }
}

struct FailingBackend;

#[async_trait]
impl InferenceBackend for FailingBackend {
    async fn generate(&self, _: &[Message], _: &GenerationParams) -> Result<String, AiError> {
        Err(AiError::UpstreamUnavailable("connection refused".into()))
    }
}

fn manager(backend: Arc<dyn InferenceBackend>) -> SessionManager {
    SessionManager::new(backend, &SessionsConfig::default())
}

fn params() -> GenerationParams {
    GenerationParams::default()
}

#[tokio::test]
async fn opened_session_holds_only_system_prompt() {
    let manager = manager(Arc::new(FixedBackend("R")));
    manager.open_session("s1", "P").await;

    let history = manager.get_history("s1").await.unwrap();
    assert_eq!(history, vec![Message::system("P")]);
}

#[tokio::test]
async fn one_turn_records_user_and_assistant() {
    let manager = manager(Arc::new(FixedBackend("R")));
    let reply = manager
        .process_message("s1", "P", "hi", &params())
        .await
        .unwrap();
    assert_eq!(reply, "R");

    let history = manager.get_history("s1").await.unwrap();
    assert_eq!(
        history,
        vec![
            Message::system("P"),
            Message::user("hi"),
            Message::assistant("R"),
        ]
    );
}

#[tokio::test]
async fn later_system_prompt_is_ignored() {
    let manager = manager(Arc::new(FixedBackend("R")));
    manager.process_message("s1", "P", "hi", &params()).await.unwrap();
    manager
        .process_message("s1", "something else", "again", &params())
        .await
        .unwrap();

    let history = manager.get_history("s1").await.unwrap();
    assert_eq!(history[0], Message::system("P"));
}

#[tokio::test]
async fn history_is_bounded_to_recent_turns() {
    let manager = manager(Arc::new(EchoBackend::default())).with_max_history(2);
    for i in 0..10 {
        manager
            .process_message("s1", "P", &format!("msg {i}"), &params())
            .await
            .unwrap();
    }

    let history = manager.get_history("s1").await.unwrap();
    assert_eq!(history[0], Message::system("P"));
    let tail = &history[1..];
    assert_eq!(tail.len(), 4);
    assert_eq!(tail[0], Message::user("msg 8"));
    assert!(tail[1].content.starts_with("echo: msg 8"));
    assert_eq!(tail[2], Message::user("msg 9"));
    assert!(tail[3].content.starts_with("echo: msg 9"));

    let info = manager.session_info("s1").await.unwrap();
    assert_eq!(info.turn_count, 10);
    assert_eq!(info.message_count, 5);
}

#[tokio::test]
async fn backend_sees_trimmed_snapshot() {
    let manager = manager(Arc::new(EchoBackend::default())).with_max_history(1);
    manager.process_message("s1", "P", "a", &params()).await.unwrap();
    let reply = manager.process_message("s1", "P", "b", &params()).await.unwrap();

    // system + (assistant "a" reply, user "b") after trimming to 2 entries
    assert_eq!(reply, "echo: b (3 messages seen)");
}

#[tokio::test]
async fn clear_then_history_is_not_found() {
    let manager = manager(Arc::new(FixedBackend("R")));
    manager.process_message("s1", "P", "hi", &params()).await.unwrap();

    manager.clear_session("s1").await;
    let err = manager.get_history("s1").await.unwrap_err();
    assert!(matches!(err, AiError::NotFound(ref id) if id == "s1"));

    // Second clear is a no-op.
    manager.clear_session("s1").await;
    assert_eq!(manager.session_count().await, 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let manager = manager(Arc::new(FixedBackend("R")));
    assert!(matches!(
        manager.get_history("nope").await,
        Err(AiError::NotFound(_))
    ));
    assert!(matches!(
        manager.session_info("nope").await,
        Err(AiError::NotFound(_))
    ));
}

#[tokio::test]
async fn stream_chunks_concatenate_to_plain_reply() {
    let plain = manager(Arc::new(EchoBackend::default()));
    let expected = plain
        .process_message("s1", "P", "tell me a story", &params())
        .await
        .unwrap();

    let streaming = manager(Arc::new(EchoBackend::default()));
    let mut chunks: Vec<String> = Vec::new();
    streaming
        .process_message_stream(
            "s1",
            "P",
            "tell me a story",
            |chunk: &str| chunks.push(chunk.to_string()),
            &params(),
        )
        .await;

    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), expected);

    let history = streaming.get_history("s1").await.unwrap();
    assert_eq!(history.last(), Some(&Message::assistant(expected)));
}

#[tokio::test]
async fn failed_stream_sends_error_chunk_and_records_nothing() {
    let manager = manager(Arc::new(FailingBackend));
    let mut chunks: Vec<String> = Vec::new();
    manager
        .process_message_stream(
            "s1",
            "P",
            "hi",
            |chunk: &str| chunks.push(chunk.to_string()),
            &params(),
        )
        .await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with("Error: "));

    let history = manager.get_history("s1").await.unwrap();
    assert_eq!(history, vec![Message::system("P"), Message::user("hi")]);
}

#[tokio::test]
async fn failed_turn_propagates_error() {
    let manager = manager(Arc::new(FailingBackend));
    let err = manager
        .process_message("s1", "P", "hi", &params())
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn different_sessions_do_not_wait_for_each_other() {
    let delay = Duration::from_millis(300);
    let manager = manager(Arc::new(EchoBackend::delayed(delay)));

    let params = params();
    let start = Instant::now();
    let (a, b) = tokio::join!(
        manager.process_message("alice", "P", "one", &params),
        manager.process_message("bob", "P", "two", &params),
    );
    let elapsed = start.elapsed();

    assert!(a.is_ok() && b.is_ok());
    assert!(elapsed >= delay);
    assert!(
        elapsed < delay * 2 - Duration::from_millis(50),
        "turns serialized: took {elapsed:?}"
    );
}

#[tokio::test]
async fn reply_for_cleared_session_is_dropped() {
    let backend = Arc::new(GatedBackend::default());
    let manager = Arc::new(manager(backend.clone()));

    let turn = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager
                .process_message("s1", "P", "hi", &GenerationParams::default())
                .await
        })
    };

    backend.entered.notified().await;
    manager.clear_session("s1").await;
    backend.release.notify_one();

    let reply = turn.await.unwrap().unwrap();
    assert_eq!(reply, "late reply");
    assert!(matches!(
        manager.get_history("s1").await,
        Err(AiError::NotFound(_))
    ));
}

#[tokio::test]
async fn serialized_turns_alternate_on_one_session() {
    let backend = Arc::new(EchoBackend::delayed(Duration::from_millis(100)));
    let manager = manager(backend.clone()).with_serialized_turns(true);

    let params = params();
    let (a, b) = tokio::join!(
        manager.process_message("s1", "P", "first", &params),
        manager.process_message("s1", "P", "second", &params),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

    let history = manager.get_history("s1").await.unwrap();
    let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
        ]
    );
    // Each reply answers the user message right before it.
    for pair in history[1..].chunks(2) {
        assert!(pair[1].content.starts_with(&format!("echo: {}", pair[0].content)));
    }
}

#[tokio::test]
async fn session_ids_and_idle_eviction() {
    let manager = manager(Arc::new(FixedBackend("R")));
    manager.open_session("b", "P").await;
    manager.open_session("a", "P").await;
    assert_eq!(manager.session_ids().await, vec!["a", "b"]);

    assert_eq!(manager.evict_idle(Duration::from_secs(3600)).await, 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.evict_idle(Duration::from_millis(5)).await, 2);
    assert_eq!(manager.session_count().await, 0);
}

#[tokio::test]
async fn serialized_turns_stay_exclusive_across_clear() {
    let backend = Arc::new(OverlapBackend::default());
    let manager = Arc::new(manager(backend.clone()).with_serialized_turns(true));

    let spawn_turn = |text: &'static str| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager
                .process_message("s1", "P", text, &GenerationParams::default())
                .await
        })
    };

    // A runs, B queues behind it, the session is cleared, C recreates it.
    let a = spawn_turn("a");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let b = spawn_turn("b");
    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.clear_session("s1").await;
    let c = spawn_turn("c");

    for turn in [a, b, c] {
        turn.await.unwrap().unwrap();
    }

    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
    let roles: Vec<Role> = manager
        .get_history("s1")
        .await
        .unwrap()
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
        ]
    );
}

#[tokio::test]
async fn cleared_session_releases_its_turn_gate() {
    let manager = manager(Arc::new(FixedBackend("R"))).with_serialized_turns(true);
    manager.process_message("s1", "P", "hi", &params()).await.unwrap();
    assert_eq!(manager.store.gate_count().await, 1);

    manager.clear_session("s1").await;
    assert_eq!(manager.store.gate_count().await, 0);
}
