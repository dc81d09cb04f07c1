//! Live viewer sessions by id
//!
//! Clients that vanish without closing their session leave it behind; the
//! reaper task unmounts sessions nobody has looked up within the idle TTL,
//! and opening past the cap evicts the longest-idle session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::resolver::BookRequest;

use super::navigation::NavigationMode;
use super::session::{ViewerPipeline, ViewerSession};

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    sessions: RwLock<HashMap<Uuid, Arc<ViewerSession>>>,
    pipeline: ViewerPipeline,
    mode: NavigationMode,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(pipeline: ViewerPipeline, mode: NavigationMode, max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: RwLock::new(HashMap::new()),
                pipeline,
                mode,
                max_sessions: max_sessions.max(1),
            }),
        }
    }

    /// Create a session and start loading `request`
    pub async fn open(&self, request: BookRequest) -> Arc<ViewerSession> {
        let session = Arc::new(ViewerSession::new(self.inner.pipeline.clone(), self.inner.mode));

        let evicted = {
            let mut sessions = self.inner.sessions.write().await;
            let evicted = if sessions.len() >= self.inner.max_sessions {
                sessions
                    .iter()
                    .max_by_key(|(_, s)| s.idle_for())
                    .map(|(id, _)| *id)
                    .and_then(|id| sessions.remove(&id))
            } else {
                None
            };
            sessions.insert(session.id(), session.clone());
            evicted
        };

        if let Some(evicted) = evicted {
            tracing::warn!(
                session_id = %evicted.id(),
                max_sessions = self.inner.max_sessions,
                "Session limit reached, evicting longest idle session"
            );
            evicted.unmount().await;
        }

        tracing::info!(session_id = %session.id(), request = ?request, "Opened viewer session");
        session.start(request).await;

        session
    }

    /// Look a session up and mark it as in use
    pub async fn get(&self, id: Uuid) -> Option<Arc<ViewerSession>> {
        let session = self.inner.sessions.read().await.get(&id).cloned()?;
        session.mark_seen();
        Some(session)
    }

    /// Unmount and forget a session
    pub async fn close(&self, id: Uuid) -> bool {
        let session = self.inner.sessions.write().await.remove(&id);
        match session {
            Some(session) => {
                session.unmount().await;
                tracing::info!(session_id = %id, "Closed viewer session");
                true
            }
            None => false,
        }
    }

    /// Unmount every session; used on shutdown
    pub async fn close_all(&self) -> usize {
        let sessions: Vec<_> = self.inner.sessions.write().await.drain().collect();
        let count = sessions.len();

        for (_, session) in sessions {
            session.unmount().await;
        }

        if count > 0 {
            tracing::info!(count, "Unmounted all viewer sessions");
        }
        count
    }

    /// Unmount and forget every session idle for at least `ttl`
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let expired: Vec<Arc<ViewerSession>> = {
            let mut sessions = self.inner.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, session)| session.idle_for() >= ttl)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &expired {
            session.unmount().await;
            tracing::info!(session_id = %session.id(), "Evicted idle viewer session");
        }
        expired.len()
    }

    /// Run [`SessionRegistry::evict_idle`] every `period` until aborted
    pub fn spawn_reaper(&self, ttl: Duration, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(ttl).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    tracing::debug!(
                        evicted,
                        remaining,
                        "Reaped idle viewer sessions"
                    );
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
