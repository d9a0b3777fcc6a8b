// src/cli/sessions.rs — Session management commands

use crate::cli::SessionAction;
use crate::session::Sessions;
use crate::util::ellipsize;

pub fn run(sessions: &Sessions, action: SessionAction) -> anyhow::Result<()> {
    match action {
        SessionAction::List => {
            let rows = sessions.list()?;
            if rows.is_empty() {
                println!("No sessions.");
                return Ok(());
            }
            for row in rows {
                let state = if row.is_active { "" } else { " (archived)" };
                println!(
                    "{}  {}  {} message(s), {} product(s), last active {}{}",
                    row.session_id,
                    row.session_name,
                    row.message_count,
                    row.product_count,
                    row.last_activity,
                    state,
                );
            }
        }
        SessionAction::Show { session_id } => match sessions.session_info(&session_id)? {
            Some(info) => {
                println!("{} ({})", info.row.session_name, info.row.session_id);
                println!(
                    "created {}, last active {}",
                    info.row.created_at, info.row.last_activity
                );
                for msg in &info.history {
                    println!("  {}: {}", msg.sender, ellipsize(&msg.content, 120));
                }
                if !info.products.is_empty() {
                    println!("products:");
                    for product in &info.products {
                        println!("  - {}", product.name);
                    }
                }
            }
            None => println!("Session '{session_id}' not found."),
        },
        SessionAction::Rename {
            session_id,
            new_name,
        } => {
            if sessions.rename(&session_id, &new_name)? {
                println!("Renamed {session_id} to '{new_name}'.");
            } else {
                println!("Session '{session_id}' not found.");
            }
        }
        SessionAction::Archive { session_id } => {
            if sessions.archive(&session_id)? {
                println!("Archived {session_id}.");
            } else {
                println!("Session '{session_id}' not found.");
            }
        }
        SessionAction::Delete { session_id } => {
            if sessions.delete(&session_id)? {
                println!("Deleted {session_id}.");
            } else {
                println!("Session '{session_id}' not found.");
            }
        }
    }
    Ok(())
}
