// src/session/document.rs — The per-session JSON document
//
// One JSON file per session under sessions_dir, authoritative for message
// and product content. The relational row mirrors counts and timestamps for
// listing and is always rebuildable from this document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::infra::errors::AftersalesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// One chat turn. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub sender: Sender,
    pub content: String,
}

/// A product the session has touched, with optional free-form details
/// (price, category, whatever the search side attaches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMention {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub product_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub products: Vec<ProductMention>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl SessionDocument {
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            created_at: now,
            last_activity: now,
            history: Vec::new(),
            products: Vec::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Keep the embedded counts in step with the actual sequences.
    pub fn refresh_metadata(&mut self) {
        self.metadata.message_count = self.history.len();
        self.metadata.product_count = self.products.len();
    }

    pub fn load(path: &Path) -> Result<Self, AftersalesError> {
        let content = std::fs::read_to_string(path)?;
        let doc: SessionDocument = serde_json::from_str(&content)?;
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<(), AftersalesError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
