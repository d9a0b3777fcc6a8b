// src/assist/engine.rs — One chat turn, end to end
//
// resolve session -> append user message -> render context -> collaborator.
// The only delegation serviced in-core is the manual lookup (locator +
// extraction pipeline); every other category belongs to collaborators this
// crate does not implement and is handed back to the caller.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::assist::{Assistant, AssistantReply, Delegation};
use crate::catalog::Catalog;
use crate::extract::Pipeline;
use crate::infra::errors::AftersalesError;
use crate::session::{Sender, Sessions};

/// Result of handling one inbound message.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Final response text, already appended to the session.
    Reply(String),
    /// A delegation this core does not service. The caller routes it and
    /// appends the eventual text via [`Engine::complete_turn`].
    Unserviced(Delegation),
}

pub struct Engine {
    sessions: Arc<Sessions>,
    catalog: Arc<Catalog>,
    pipeline: Pipeline,
    assistant: Arc<dyn Assistant>,
}

impl Engine {
    pub fn new(
        sessions: Arc<Sessions>,
        catalog: Arc<Catalog>,
        pipeline: Pipeline,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        Self {
            sessions,
            catalog,
            pipeline,
            assistant,
        }
    }

    /// Drive one turn. The user message is appended (subject to the double
    /// submission guard) before the collaborator is invoked; the final text
    /// is appended as the assistant message.
    pub async fn handle_message(
        &self,
        session_id: Option<&str>,
        text: &str,
    ) -> Result<TurnOutcome, AftersalesError> {
        let stored = self.sessions.add_message(session_id, Sender::User, text)?;
        if !stored {
            debug!("duplicate user message suppressed before dispatch");
        }

        let context = {
            let store = self.sessions.resolve(session_id)?;
            let guard = store.lock().unwrap();
            guard.detailed_context()
        };

        let reply = self
            .assistant
            .respond(text, &context)
            .await
            .map_err(AftersalesError::Other)?;

        let response = match reply {
            AssistantReply::Text(t) => t,
            AssistantReply::Delegate(Delegation::ManualLookup { product, .. }) => {
                self.manual_lookup(session_id, text, &context, &product)
                    .await?
            }
            AssistantReply::Delegate(other) => {
                debug!(delegation = ?other, "delegation handed back to caller");
                return Ok(TurnOutcome::Unserviced(other));
            }
        };

        self.sessions
            .add_message(session_id, Sender::Assistant, &response)?;
        Ok(TurnOutcome::Reply(response))
    }

    /// Append response text produced outside this core (after an unserviced
    /// delegation was routed elsewhere).
    pub fn complete_turn(
        &self,
        session_id: Option<&str>,
        response: &str,
    ) -> Result<bool, AftersalesError> {
        self.sessions
            .add_message(session_id, Sender::Assistant, response)
    }

    /// Service a manual lookup: resolve the product to a stored manual,
    /// extract it off the request path, then let the collaborator answer
    /// from the content. Not-found and timeout outcomes are normal response
    /// text; an undecryptable document stays a hard failure.
    async fn manual_lookup(
        &self,
        session_id: Option<&str>,
        user_text: &str,
        context: &str,
        product: &str,
    ) -> Result<String, AftersalesError> {
        let (record, path) = match self.catalog.locate_manual(product)? {
            Some(hit) => (hit.0.clone(), hit.1),
            None => {
                return Ok(format!(
                    "I could not find a manual for '{product}'. \
                     Could you give me the exact model number?"
                ));
            }
        };

        let mut details = serde_json::Map::new();
        details.insert(
            "model_number".into(),
            serde_json::Value::String(record.model_number.clone()),
        );
        details.insert(
            "manual_path".into(),
            serde_json::Value::String(record.manual_path.clone()),
        );
        self.sessions
            .add_product_mention(session_id, &record.name, Some(details))?;

        let extracted = match self.pipeline.extract_path_timed(&path).await {
            Ok(doc) => doc,
            Err(e @ AftersalesError::ExtractionTimeout { .. }) => {
                warn!(error = %e, "manual extraction timed out");
                return Ok(format!(
                    "Reading the manual for '{}' is taking longer than expected. \
                     Please ask again in a moment.",
                    record.name
                ));
            }
            Err(e) => return Err(e),
        };

        let rendered = extracted.render();
        let augmented = format!(
            "{context}\nManual content for {} ({}):\n{rendered}",
            record.name, record.model_number
        );

        match self
            .assistant
            .respond(user_text, &augmented)
            .await
            .map_err(AftersalesError::Other)?
        {
            AssistantReply::Text(t) => Ok(t),
            AssistantReply::Delegate(d) => {
                // One tool round per turn; fall back to the raw content.
                warn!(delegation = ?d, "collaborator delegated again, returning manual content");
                Ok(rendered)
            }
        }
    }
}
