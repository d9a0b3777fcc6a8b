// src/session/hydrate.rs — Rebuild the relational mirror from JSON documents
//
// Run at startup or on demand, after process restarts or external file
// drops. The JSON documents are the source of truth; rows are created or
// refreshed to match, never the other way around. Unparseable files are
// skipped, not fatal.

use std::path::Path;
use tracing::{info, warn};

use crate::infra::errors::AftersalesError;
use crate::session::db::SessionDb;
use crate::session::document::SessionDocument;

/// Reconcile every session document under `dir` into the metadata table.
/// Returns how many rows were created or updated; a second run over
/// unchanged files returns 0.
pub fn hydrate_sessions(dir: &Path, db: &SessionDb) -> Result<usize, AftersalesError> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut synced = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let doc = match SessionDocument::load(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(
                    file = %path.display(),
                    error = %e,
                    "skipping unparseable session document"
                );
                continue;
            }
        };

        // Fall back to the filename when the document lacks an id.
        let session_id = if doc.session_id.is_empty() {
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            }
        } else {
            doc.session_id.clone()
        };

        let last_activity = doc.last_activity.to_rfc3339();
        let mut changed = false;

        match db
            .get_session(&session_id)
            .map_err(AftersalesError::Other)?
        {
            None => {
                db.create_session(&session_id, doc.metadata.session_name.as_deref())
                    .map_err(AftersalesError::Other)?;
                db.update_activity(
                    &session_id,
                    doc.history.len(),
                    doc.products.len(),
                    &last_activity,
                )
                .map_err(AftersalesError::Other)?;
                changed = true;
            }
            Some(row) => {
                if row.message_count != doc.history.len()
                    || row.product_count != doc.products.len()
                    || row.last_activity != last_activity
                {
                    db.update_activity(
                        &session_id,
                        doc.history.len(),
                        doc.products.len(),
                        &last_activity,
                    )
                    .map_err(AftersalesError::Other)?;
                    changed = true;
                }

                if let Some(name) = &doc.metadata.session_name {
                    if *name != row.session_name {
                        db.rename_session(&session_id, name)
                            .map_err(AftersalesError::Other)?;
                        changed = true;
                    }
                }
            }
        }

        if changed {
            synced += 1;
        }
    }

    if synced > 0 {
        info!(synced, "session mirror hydrated from disk");
    }
    Ok(synced)
}
