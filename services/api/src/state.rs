//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the session store and service clients.

use crate::config::Config;
use interview_core::{
    InterviewSession, domain::DomainCatalog, llm_client::LLMClient, prompts::PromptTemplates,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::Instant,
};
use tracing::info;
use uuid::Uuid;

struct StoredSession {
    session: Arc<Mutex<InterviewSession>>,
    last_used: Instant,
}

/// Live interviews keyed by session id. Each session has its own lock, so
/// concurrent interviews never wait on each other's completions.
///
/// Every lookup refreshes the session's idle clock; `evict_idle` drops
/// interviews that were abandoned without being concluded.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, StoredSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: InterviewSession) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(
            id,
            StoredSession {
                session: Arc::new(Mutex::new(session)),
                last_used: Instant::now(),
            },
        );
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<InterviewSession>>> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(id)?;
        stored.last_used = Instant::now();
        Some(stored.session.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Mutex<InterviewSession>>> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|stored| stored.session)
    }

    /// Drops every session untouched for longer than `idle_timeout`.
    /// Returns how many were removed.
    pub async fn evict_idle(&self, idle_timeout: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.last_used.elapsed() <= idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle interview sessions");
        }
        evicted
    }

    /// Runs `evict_idle` every `every` until the task is aborted.
    pub fn spawn_idle_sweeper(
        self: Arc<Self>,
        idle_timeout: Duration,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.evict_idle(idle_timeout).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub domains: Arc<dyn DomainCatalog>,
    pub llm_client: Arc<dyn LLMClient>,
    pub prompts: Arc<PromptTemplates>,
    pub config: Arc<Config>,
}
