// src/assist/mod.rs — The external intent/response collaborator seam
//
// The LLM that classifies intent and writes answers lives outside this
// crate. It sees (user text, rendered context) and hands back either final
// text or a structured delegation instruction. The instruction is a closed
// sum type: recognized expert categories exist as variants, not as free
// text to be parsed.

pub mod engine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use engine::{Engine, TurnOutcome};

/// A delegation instruction naming the expert a reply should come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Delegation {
    /// Search the product database.
    ProductSearch { query: String },
    /// Answer from the product's manual.
    ManualLookup { product: String, question: String },
    /// Diagnose a technical problem.
    Troubleshooting { product: String, issue: String },
    /// Store policies, warranty, delivery and the like.
    GeneralInfo { topic: String },
    /// Post-purchase setup walkthrough.
    Quickstart { product: String },
}

/// What the collaborator returns for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Text(String),
    Delegate(Delegation),
}

/// The collaborator itself. This crate never validates the semantics of
/// what comes back; it supplies the context string and persists the
/// eventual text.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn respond(&self, user_text: &str, context: &str) -> anyhow::Result<AssistantReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_wire_shape() {
        let d = Delegation::ManualLookup {
            product: "SO 6004".into(),
            question: "how do I start a program".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&d).unwrap();
        assert_eq!(json["category"], "manual_lookup");
        assert_eq!(json["product"], "SO 6004");

        let back: Delegation = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
