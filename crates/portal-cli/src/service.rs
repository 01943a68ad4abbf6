//! Explicit construction of the inference client and session manager.

use std::sync::Arc;
use std::time::Duration;

use portal_ai::{InferenceBackend, InferenceClient, InferenceConfig, SessionManager};
use portal_common::PortalError;
use portal_config::PortalConfig;
use tokio::task::JoinHandle;

const MAX_REAPER_TICK: Duration = Duration::from_secs(60);

/// Everything a command needs, built once at startup.
pub struct Service {
    client: Arc<InferenceClient>,
    sessions: Arc<SessionManager>,
    reaper: Option<JoinHandle<()>>,
}

impl Service {
    /// Build the client, probe upstream once, and start the idle reaper
    /// when `sessions.idle_timeout_secs` is set.
    pub async fn start(config: &PortalConfig) -> Result<Self, PortalError> {
        let client = Arc::new(InferenceClient::new(InferenceConfig::from(&config.llm))?);

        if client.probe().await {
            tracing::info!(server_url = %config.llm.server_url, "upstream available");
        } else {
            tracing::warn!(
                server_url = %config.llm.server_url,
                "upstream not reachable, requests will fail until it is"
            );
        }

        let backend: Arc<dyn InferenceBackend> = client.clone();
        let sessions = Arc::new(SessionManager::new(backend, &config.sessions));

        let reaper = match config.sessions.idle_timeout_secs {
            0 => None,
            secs => Some(spawn_reaper(
                Arc::clone(&sessions),
                Duration::from_secs(secs),
            )),
        };

        Ok(Self {
            client,
            sessions,
            reaper,
        })
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
    }
}

fn spawn_reaper(sessions: Arc<SessionManager>, max_idle: Duration) -> JoinHandle<()> {
    let tick = (max_idle / 2).clamp(Duration::from_secs(1), MAX_REAPER_TICK);
    tracing::info!(max_idle_secs = max_idle.as_secs(), "idle session reaper started");

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tick).await;
            let evicted = sessions.evict_idle(max_idle).await;
            let count = sessions.session_count().await;
            tracing::debug!(evicted, sessions = count, "reaper tick");
        }
    })
}
