// src/cli/mod.rs — CLI definition (clap derive)

pub mod extract;
pub mod hydrate;
pub mod sessions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aftersales", about = "Support-assistant core: manuals, sessions, catalog", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and manage chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Reconcile on-disk session documents into the metadata table
    Hydrate,
    /// Resolve a product reference to a stored manual
    Locate {
        /// Free-text product reference (name fragments, model number)
        query: String,
    },
    /// Extract a product's manual and print the text
    Extract {
        /// Free-text product reference (name fragments, model number)
        query: String,
        /// Override the wall-clock budget in seconds
        #[arg(long)]
        max_seconds: Option<u64>,
        /// Override the output size budget in characters
        #[arg(long)]
        max_chars: Option<usize>,
    },
}

#[derive(Subcommand, Clone)]
pub enum SessionAction {
    /// List all sessions, most recently active first
    List,
    /// Show one session's metadata and transcript
    Show {
        session_id: String,
    },
    /// Change a session's display name
    Rename {
        session_id: String,
        new_name: String,
    },
    /// Soft-deactivate a session without deleting its content
    Archive {
        session_id: String,
    },
    /// Remove a session from both the document store and the database
    Delete {
        session_id: String,
    },
}
