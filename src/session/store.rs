// src/session/store.rs — Conversation history + product memory for one session
//
// Whole-document read/modify/write: every successful append rewrites the
// JSON document and then mirrors counts into the relational row. The JSON
// side is written first and wins; the row can always be rebuilt from it.

use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::infra::config::SessionConfig;
use crate::infra::errors::AftersalesError;
use crate::session::db::SessionDb;
use crate::session::document::{Message, ProductMention, Sender, SessionDocument};
use crate::util::ellipsize;

/// Category keywords scanned in user messages to infer what the customer is
/// shopping for. Plain substring match, deliberately dumb.
const CATEGORY_KEYWORDS: &[&str] = &[
    "refrigerator",
    "fridge",
    "freezer",
    "oven",
    "washing machine",
    "television",
    "tv",
    "microwave",
    "dishwasher",
    "dryer",
    "vacuum cleaner",
];

/// Live state for one session.
pub struct SessionStore {
    session_id: String,
    dir: PathBuf,
    path: PathBuf,
    doc: SessionDocument,
    cfg: SessionConfig,
}

impl SessionStore {
    /// Open a session, loading its persisted document if one exists.
    /// A corrupt document resets to an empty session in memory; the loss is
    /// logged, not hidden, and nothing is overwritten until the next write.
    pub fn open(dir: &Path, session_id: &str, cfg: SessionConfig) -> Self {
        let path = dir.join(format!("{session_id}.json"));
        let doc = if path.exists() {
            match SessionDocument::load(&path) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        session = session_id,
                        error = %e,
                        "session document unreadable, starting empty"
                    );
                    SessionDocument::new(session_id)
                }
            }
        } else {
            SessionDocument::new(session_id)
        };

        Self {
            session_id: session_id.to_string(),
            dir: dir.to_path_buf(),
            path,
            doc,
            cfg,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn document(&self) -> &SessionDocument {
        &self.doc
    }

    /// Re-read the persisted document, picking up out-of-process writes.
    /// Used on cache hits; in-memory state is replaced wholesale.
    pub fn reload(&mut self) {
        if !self.path.exists() {
            return;
        }
        match SessionDocument::load(&self.path) {
            Ok(doc) => self.doc = doc,
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "reload failed, keeping in-memory state");
            }
        }
    }

    /// Append a message, suppressing double submissions: an identical
    /// (sender, content) pair within the dedup window after the previous
    /// message is a silent no-op. Returns whether the message was stored.
    pub fn add_message(
        &mut self,
        db: &SessionDb,
        sender: Sender,
        content: &str,
    ) -> Result<bool, AftersalesError> {
        let now = Utc::now();

        if let Some(last) = self.doc.history.last() {
            if last.sender == sender && last.content == content {
                let elapsed = now.signed_duration_since(last.timestamp);
                if elapsed < Duration::seconds(self.cfg.dedup_window_secs) {
                    debug!(
                        session = %self.session_id,
                        sender = %sender,
                        content = %ellipsize(content, 50),
                        "duplicate message within window, suppressed"
                    );
                    return Ok(false);
                }
            }
        }

        self.doc.history.push(Message {
            timestamp: now,
            sender,
            content: content.to_string(),
        });
        self.doc.last_activity = now;
        self.persist(db)?;
        Ok(true)
    }

    /// Record a product the conversation touched. Only the most recent
    /// `mention_cap` entries are retained (oldest evicted first).
    pub fn add_product_mention(
        &mut self,
        db: &SessionDb,
        name: &str,
        details: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<(), AftersalesError> {
        let now = Utc::now();
        self.doc.products.push(ProductMention {
            name: name.to_string(),
            timestamp: now,
            details: details.unwrap_or_default(),
        });

        let cap = self.cfg.mention_cap;
        if self.doc.products.len() > cap {
            let excess = self.doc.products.len() - cap;
            self.doc.products.drain(..excess);
        }

        self.doc.last_activity = now;
        self.persist(db)
    }

    pub fn history(&self) -> &[Message] {
        &self.doc.history
    }

    pub fn products(&self) -> &[ProductMention] {
        &self.doc.products
    }

    /// Full history for this session, or another session's persisted history
    /// read from disk without touching this session's state.
    pub fn history_for(&self, session_id: &str) -> Vec<Message> {
        if session_id == self.session_id {
            return self.doc.history.clone();
        }

        let path = self.dir.join(format!("{session_id}.json"));
        if !path.exists() {
            return Vec::new();
        }
        match SessionDocument::load(&path) {
            Ok(doc) => doc.history,
            Err(e) => {
                warn!(session = session_id, error = %e, "could not read session history");
                Vec::new()
            }
        }
    }

    /// A short transcript of the last `n` messages for seeding the
    /// assistant's context, each entry clipped to ~100 characters.
    pub fn recent_context(&self, n: usize) -> String {
        if self.doc.history.is_empty() {
            return "New conversation.".to_string();
        }

        let mut out = String::from("Recent conversation:\n");
        let start = self.doc.history.len().saturating_sub(n);
        for msg in &self.doc.history[start..] {
            out.push_str(&format!("{}: {}\n", msg.sender, ellipsize(&msg.content, 100)));
        }
        out
    }

    /// The richer context handed to the assistant: recent transcript,
    /// recently discussed products, and inferred category interest.
    pub fn detailed_context(&self) -> String {
        let mut out = String::new();

        if !self.doc.history.is_empty() {
            out.push_str("Conversation history:\n");
            let start = self.doc.history.len().saturating_sub(5);
            for msg in &self.doc.history[start..] {
                out.push_str(&format!(
                    "{}: {}\n",
                    msg.sender,
                    ellipsize(&msg.content, 150)
                ));
            }
            out.push('\n');
        }

        if !self.doc.products.is_empty() {
            out.push_str("Products discussed this session:\n");
            let start = self.doc.products.len().saturating_sub(3);
            for product in &self.doc.products[start..] {
                out.push_str(&format!("- {}\n", product.name));
            }
            out.push('\n');
        }

        let interests = self.inferred_interests();
        if !interests.is_empty() {
            out.push_str("Categories the customer asked about:\n");
            for category in interests.iter().take(2) {
                out.push_str(&format!("- {category}\n"));
            }
            out.push('\n');
        }

        if out.is_empty() {
            "New conversation starting.".to_string()
        } else {
            out
        }
    }

    /// Category keywords found in user messages, most recently seen first,
    /// deduplicated.
    pub fn inferred_interests(&self) -> Vec<String> {
        let mut interests: Vec<String> = Vec::new();
        for msg in self.doc.history.iter().rev() {
            if msg.sender != Sender::User {
                continue;
            }
            let content = msg.content.to_lowercase();
            for keyword in CATEGORY_KEYWORDS {
                if content.contains(keyword) && !interests.iter().any(|k| k == keyword) {
                    interests.push((*keyword).to_string());
                }
            }
        }
        interests
    }

    /// The most recently mentioned product, falling back to the most recent
    /// inferred category.
    pub fn last_mentioned_product(&self) -> Option<String> {
        if let Some(product) = self.doc.products.last() {
            return Some(product.name.clone());
        }
        self.inferred_interests().into_iter().next()
    }

    /// Write-through persistence: JSON document first (authoritative), then
    /// the relational mirror. A crash between the two leaves the document as
    /// the side hydration rebuilds from.
    pub fn persist(&mut self, db: &SessionDb) -> Result<(), AftersalesError> {
        self.doc.refresh_metadata();
        self.doc.save(&self.path)?;

        let last_activity = self.doc.last_activity.to_rfc3339();
        let touched = db
            .update_activity(
                &self.session_id,
                self.doc.history.len(),
                self.doc.products.len(),
                &last_activity,
            )
            .map_err(AftersalesError::Other)?;

        if touched == 0 {
            // Row not there yet (first write, or deleted out from under us).
            db.create_session(&self.session_id, self.doc.metadata.session_name.as_deref())
                .map_err(AftersalesError::Other)?;
            db.update_activity(
                &self.session_id,
                self.doc.history.len(),
                self.doc.products.len(),
                &last_activity,
            )
            .map_err(AftersalesError::Other)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, SessionDb, SessionStore) {
        let dir = tempdir().unwrap();
        let db = SessionDb::in_memory().unwrap();
        let store = SessionStore::open(dir.path(), "s1", SessionConfig::default());
        (dir, db, store)
    }

    #[test]
    fn test_duplicate_within_window_suppressed() {
        let (_dir, db, mut store) = setup();

        assert!(store.add_message(&db, Sender::User, "my tv is broken").unwrap());
        assert!(!store.add_message(&db, Sender::User, "my tv is broken").unwrap());
        assert_eq!(store.history().len(), 1);

        // Different content is not a duplicate.
        assert!(store.add_message(&db, Sender::User, "still broken").unwrap());
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_duplicate_after_window_kept() {
        let (_dir, db, mut store) = setup();
        store.add_message(&db, Sender::User, "hello").unwrap();

        // Backdate the stored message past the window.
        store.doc.history[0].timestamp = Utc::now() - Duration::seconds(10);
        assert!(store.add_message(&db, Sender::User, "hello").unwrap());
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_same_content_different_sender_not_duplicate() {
        let (_dir, db, mut store) = setup();
        store.add_message(&db, Sender::User, "ok").unwrap();
        assert!(store.add_message(&db, Sender::Assistant, "ok").unwrap());
    }

    #[test]
    fn test_mention_cap_evicts_oldest() {
        let (_dir, db, mut store) = setup();
        for i in 0..8 {
            store
                .add_product_mention(&db, &format!("Product {i}"), None)
                .unwrap();
        }
        assert_eq!(store.products().len(), 5);
        assert_eq!(store.products()[0].name, "Product 3");
        assert_eq!(store.products()[4].name, "Product 7");
    }

    #[test]
    fn test_mirror_counts_match_document() {
        let (_dir, db, mut store) = setup();
        store.add_message(&db, Sender::User, "hi").unwrap();
        store.add_message(&db, Sender::Assistant, "hello").unwrap();
        store.add_product_mention(&db, "Smart TV", None).unwrap();

        let row = db.get_session("s1").unwrap().unwrap();
        assert_eq!(row.message_count, 2);
        assert_eq!(row.product_count, 1);
        assert_eq!(
            row.last_activity,
            store.document().last_activity.to_rfc3339()
        );
    }

    #[test]
    fn test_recent_context_clips_and_limits() {
        let (_dir, db, mut store) = setup();
        store.add_message(&db, Sender::User, "one").unwrap();
        store.add_message(&db, Sender::Assistant, "two").unwrap();
        store.add_message(&db, Sender::User, "three").unwrap();
        store
            .add_message(&db, Sender::Assistant, &"x".repeat(300))
            .unwrap();

        let context = store.recent_context(3);
        assert!(!context.contains("one"));
        assert!(context.contains("two"));
        assert!(context.contains("three"));
        // Long entries are clipped.
        assert!(context.contains(&format!("{}...", "x".repeat(100))));
    }

    #[test]
    fn test_detailed_context_sections() {
        let (_dir, db, mut store) = setup();
        store
            .add_message(&db, Sender::User, "looking for a dishwasher")
            .unwrap();
        store
            .add_product_mention(&db, "Dishwasher SO-6004 B", None)
            .unwrap();

        let context = store.detailed_context();
        assert!(context.contains("Conversation history:"));
        assert!(context.contains("Products discussed this session:"));
        assert!(context.contains("- Dishwasher SO-6004 B"));
        assert!(context.contains("Categories the customer asked about:"));
        assert!(context.contains("- dishwasher"));
    }

    #[test]
    fn test_detailed_context_empty_session() {
        let (_dir, _db, store) = setup();
        assert_eq!(store.detailed_context(), "New conversation starting.");
        assert_eq!(store.recent_context(3), "New conversation.");
    }

    #[test]
    fn test_inferred_interests_recent_first_dedup() {
        let (_dir, db, mut store) = setup();
        store
            .add_message(&db, Sender::User, "do you sell a fridge")
            .unwrap();
        store
            .add_message(&db, Sender::User, "actually I need a tv")
            .unwrap();
        store
            .add_message(&db, Sender::User, "a big tv for football")
            .unwrap();

        let interests = store.inferred_interests();
        assert_eq!(interests[0], "tv");
        assert_eq!(interests[1], "fridge");
        assert_eq!(interests.iter().filter(|k| *k == "tv").count(), 1);
    }

    #[test]
    fn test_last_mentioned_product_fallbacks() {
        let (_dir, db, mut store) = setup();
        assert!(store.last_mentioned_product().is_none());

        store
            .add_message(&db, Sender::User, "need an oven")
            .unwrap();
        assert_eq!(store.last_mentioned_product().as_deref(), Some("oven"));

        store
            .add_product_mention(&db, "Built-in Oven AD-6001 X", None)
            .unwrap();
        assert_eq!(
            store.last_mentioned_product().as_deref(),
            Some("Built-in Oven AD-6001 X")
        );
    }

    #[test]
    fn test_corrupt_document_resets_empty() {
        let dir = tempdir().unwrap();
        let db = SessionDb::in_memory().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let mut store = SessionStore::open(dir.path(), "bad", SessionConfig::default());
        assert!(store.history().is_empty());

        // The next write replaces the corrupt file.
        store.add_message(&db, Sender::User, "fresh start").unwrap();
        let reloaded = SessionStore::open(dir.path(), "bad", SessionConfig::default());
        assert_eq!(reloaded.history().len(), 1);
    }

    #[test]
    fn test_history_for_other_session_does_not_mutate() {
        let dir = tempdir().unwrap();
        let db = SessionDb::in_memory().unwrap();

        let mut other = SessionStore::open(dir.path(), "other", SessionConfig::default());
        other.add_message(&db, Sender::User, "elsewhere").unwrap();

        let mut active = SessionStore::open(dir.path(), "active", SessionConfig::default());
        active.add_message(&db, Sender::User, "here").unwrap();

        let fetched = active.history_for("other");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].content, "elsewhere");
        assert_eq!(active.history().len(), 1);
        assert_eq!(active.history()[0].content, "here");

        assert!(active.history_for("missing").is_empty());
    }
}
