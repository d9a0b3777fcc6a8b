// src/session/mod.rs — Session persistence (JSON documents + SQLite mirror)

pub mod cache;
pub mod db;
pub mod document;
pub mod hydrate;
pub mod schema;
pub mod store;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::infra::config::SessionConfig;
use crate::infra::errors::AftersalesError;

pub use cache::{SessionCache, DEFAULT_SESSION_ID};
pub use db::{SessionDb, SessionRow};
pub use document::{Message, ProductMention, Sender, SessionDocument};
pub use store::SessionStore;

/// Everything the listing UI wants about one session: the relational row
/// merged with the JSON document's content.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub row: SessionRow,
    pub history: Vec<Message>,
    pub products: Vec<ProductMention>,
}

/// Owner of all session state: the metadata database, the documents
/// directory, and the bounded cache of live stores. Constructed once and
/// handed to request handlers.
pub struct Sessions {
    db: Mutex<SessionDb>,
    dir: PathBuf,
    cfg: SessionConfig,
    cache: SessionCache,
}

impl Sessions {
    /// Open against on-disk stores, creating the documents directory and
    /// running migrations as needed.
    pub fn open(
        dir: PathBuf,
        db_path: &std::path::Path,
        cfg: SessionConfig,
    ) -> Result<Self, AftersalesError> {
        std::fs::create_dir_all(&dir)?;
        let db = SessionDb::open(db_path).map_err(AftersalesError::Other)?;
        Ok(Self::with_db(dir, db, cfg))
    }

    /// Assemble from parts (tests use an in-memory database here).
    pub fn with_db(dir: PathBuf, db: SessionDb, cfg: SessionConfig) -> Self {
        let cache = SessionCache::new(cfg.cache_capacity);
        Self {
            db: Mutex::new(db),
            dir,
            cfg,
            cache,
        }
    }

    /// Resolve a session store through the cache, creating the session on
    /// first reference. `None` maps to the well-known default session.
    pub fn resolve(
        &self,
        session_id: Option<&str>,
    ) -> Result<Arc<Mutex<SessionStore>>, AftersalesError> {
        let store = self.cache.resolve(&self.dir, session_id, &self.cfg);
        let id = session_id.unwrap_or(DEFAULT_SESSION_ID);
        self.db
            .lock()
            .unwrap()
            .create_session(id, None)
            .map_err(AftersalesError::Other)?;
        Ok(store)
    }

    /// Explicitly create a session, generating an id when none is given.
    /// The empty document is persisted immediately.
    pub fn create(&self, session_id: Option<&str>) -> Result<String, AftersalesError> {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let store = self.resolve(Some(&id))?;
        let mut guard = store.lock().unwrap();
        let db = self.db.lock().unwrap();
        guard.persist(&db)?;
        Ok(id)
    }

    /// Append a message to a session (creating it on first reference).
    /// Returns false when the append was suppressed as a double submission.
    pub fn add_message(
        &self,
        session_id: Option<&str>,
        sender: Sender,
        content: &str,
    ) -> Result<bool, AftersalesError> {
        let store = self.resolve(session_id)?;
        let mut guard = store.lock().unwrap();
        let db = self.db.lock().unwrap();
        guard.add_message(&db, sender, content)
    }

    pub fn add_product_mention(
        &self,
        session_id: Option<&str>,
        name: &str,
        details: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<(), AftersalesError> {
        let store = self.resolve(session_id)?;
        let mut guard = store.lock().unwrap();
        let db = self.db.lock().unwrap();
        guard.add_product_mention(&db, name, details)
    }

    /// Persisted history for any session, without going through the cache.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        let path = self.dir.join(format!("{session_id}.json"));
        if !path.exists() {
            return Vec::new();
        }
        match SessionDocument::load(&path) {
            Ok(doc) => doc.history,
            Err(e) => {
                tracing::warn!(session = session_id, error = %e, "could not read session history");
                Vec::new()
            }
        }
    }

    /// Rename the session's display name (metadata only).
    pub fn rename(&self, session_id: &str, new_name: &str) -> Result<bool, AftersalesError> {
        self.db
            .lock()
            .unwrap()
            .rename_session(session_id, new_name)
            .map_err(AftersalesError::Other)
    }

    /// Soft-deactivate a session (metadata only; content stays on disk).
    pub fn archive(&self, session_id: &str) -> Result<bool, AftersalesError> {
        self.db
            .lock()
            .unwrap()
            .archive_session(session_id)
            .map_err(AftersalesError::Other)
    }

    /// Remove a session from both backends and the cache.
    pub fn delete(&self, session_id: &str) -> Result<bool, AftersalesError> {
        self.cache.remove(session_id);

        let row_deleted = self
            .db
            .lock()
            .unwrap()
            .delete_session(session_id)
            .map_err(AftersalesError::Other)?;

        let path = self.dir.join(format!("{session_id}.json"));
        let file_deleted = match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        Ok(row_deleted || file_deleted)
    }

    /// All sessions, most recently active first.
    pub fn list(&self) -> Result<Vec<SessionRow>, AftersalesError> {
        self.db
            .lock()
            .unwrap()
            .list_sessions()
            .map_err(AftersalesError::Other)
    }

    /// Merged metadata + content view of one session. None when neither a
    /// row nor a document exists.
    pub fn session_info(&self, session_id: &str) -> Result<Option<SessionInfo>, AftersalesError> {
        let row = self
            .db
            .lock()
            .unwrap()
            .get_session(session_id)
            .map_err(AftersalesError::Other)?;

        let path = self.dir.join(format!("{session_id}.json"));
        let doc = if path.exists() {
            SessionDocument::load(&path).ok()
        } else {
            None
        };

        let (history, products) = match &doc {
            Some(doc) => (doc.history.clone(), doc.products.clone()),
            None => (Vec::new(), Vec::new()),
        };

        match row {
            Some(row) => Ok(Some(SessionInfo {
                row,
                history,
                products,
            })),
            None => {
                let Some(doc) = doc else {
                    return Ok(None);
                };
                // Document with no row yet: synthesize listing metadata the
                // same way hydration would build it.
                Ok(Some(SessionInfo {
                    row: SessionRow {
                        session_id: session_id.to_string(),
                        session_name: doc
                            .metadata
                            .session_name
                            .clone()
                            .unwrap_or_else(|| {
                                format!("Chat {}", crate::util::truncate_str(session_id, 8))
                            }),
                        created_at: doc.created_at.to_rfc3339(),
                        last_activity: doc.last_activity.to_rfc3339(),
                        message_count: doc.history.len(),
                        product_count: doc.products.len(),
                        metadata: "{}".to_string(),
                        is_active: true,
                    },
                    history,
                    products,
                }))
            }
        }
    }

    /// Reconcile on-disk documents into the metadata table.
    pub fn hydrate(&self) -> Result<usize, AftersalesError> {
        let db = self.db.lock().unwrap();
        hydrate::hydrate_sessions(&self.dir, &db)
    }

    pub fn sessions_dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }
}
