// src/session/cache.rs — Bounded cache of live session stores
//
// FIFO by insertion order, not LRU: with a small session population the
// simpler eviction is fine, and which entry goes is an explicit ordering
// choice, not recency-based. All bookkeeping sits behind one mutex.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::infra::config::SessionConfig;
use crate::session::store::SessionStore;

/// Session id used when a request carries none.
pub const DEFAULT_SESSION_ID: &str = "default";

pub struct SessionCache {
    inner: Mutex<Inner>,
}

struct Inner {
    capacity: usize,
    entries: VecDeque<(String, Arc<Mutex<SessionStore>>)>,
}

impl SessionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                entries: VecDeque::new(),
            }),
        }
    }

    /// Return the cached store for this session, re-reading its persisted
    /// document to pick up out-of-process writes, or open and register a
    /// fresh one. Exceeding capacity evicts the oldest-inserted entry;
    /// evicted sessions lose nothing, their state is on disk.
    pub fn resolve(
        &self,
        dir: &Path,
        session_id: Option<&str>,
        cfg: &SessionConfig,
    ) -> Arc<Mutex<SessionStore>> {
        let id = session_id.unwrap_or(DEFAULT_SESSION_ID);

        let mut inner = self.inner.lock().unwrap();
        let hit = inner
            .entries
            .iter()
            .find(|(key, _)| key.as_str() == id)
            .map(|(_, store)| store.clone());

        if let Some(cached) = hit {
            drop(inner);
            cached.lock().unwrap().reload();
            return cached;
        }

        let store = Arc::new(Mutex::new(SessionStore::open(dir, id, cfg.clone())));
        inner.entries.push_back((id.to_string(), store.clone()));
        if inner.entries.len() > inner.capacity {
            if let Some((evicted, _)) = inner.entries.pop_front() {
                debug!(session = %evicted, "session cache full, evicted oldest entry");
            }
        }
        store
    }

    /// Drop a session from the cache (after delete, so a stale instance
    /// cannot re-persist it).
    pub fn remove(&self, session_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.retain(|(key, _)| key.as_str() != session_id);
    }

    pub fn contains(&self, session_id: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.entries.iter().any(|(key, _)| key.as_str() == session_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
