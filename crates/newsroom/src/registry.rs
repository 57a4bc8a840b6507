//! Session storage.
//!
//! Every session sits behind a [`SessionHandle`]. Mutating operations take the
//! handle's writer lock for their whole duration (collaborator calls included)
//! and publish their result with one short write to the snapshot. Readers only
//! touch the snapshot, so a poll never waits on a collaborator and never sees
//! a half-applied change.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::session::{Session, SessionId, SessionSummary};

pub struct SessionHandle {
    id: SessionId,
    writer: Mutex<()>,
    state: RwLock<Session>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            id: session.id,
            writer: Mutex::new(()),
            state: RwLock::new(session),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Waits for exclusive write access to this session.
    pub async fn writer(&self) -> SessionWriter<'_> {
        SessionWriter {
            _guard: self.writer.lock().await,
            state: &self.state,
        }
    }
}

/// Exclusive write access to one session. Dropping it releases the session.
pub struct SessionWriter<'a> {
    _guard: MutexGuard<'a, ()>,
    state: &'a RwLock<Session>,
}

impl SessionWriter<'_> {
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Applies `f` to the live session and bumps `updated_at`.
    pub async fn commit<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.state.write().await;
        let out = f(&mut guard);
        guard.touch();
        out
    }
}

/// Token-to-session lookup. Swappable for a durable or evicting store.
pub trait SessionRegistry: Send + Sync {
    fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>>;
    fn put(&self, session: Session) -> Arc<SessionHandle>;
    fn delete(&self, id: &SessionId) -> Option<Arc<SessionHandle>>;
    fn ids(&self) -> Vec<SessionId>;
}

/// Process-local registry. Sessions live until deleted or the process exits.
#[derive(Default)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn put(&self, session: Session) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle::new(session));
        self.sessions.insert(handle.id(), handle.clone());
        handle
    }

    fn delete(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}

pub async fn summaries(registry: &dyn SessionRegistry) -> Vec<SessionSummary> {
    let mut out = Vec::new();
    for id in registry.ids() {
        if let Some(handle) = registry.get(&id) {
            out.push(handle.read(|s| SessionSummary::from(s)).await);
        }
    }
    out.sort_by_key(|summary| summary.created_at);
    out
}
