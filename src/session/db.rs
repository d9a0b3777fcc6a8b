// src/session/db.rs — SQLite mirror of session metadata
//
// One row per session for fast listing. Content lives in the JSON
// documents; every field here can be rebuilt from them (see hydrate).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::session::schema;

/// One row of the sessions table.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub session_id: String,
    pub session_name: String,
    pub created_at: String,
    pub last_activity: String,
    pub message_count: usize,
    pub product_count: usize,
    pub metadata: String,
    pub is_active: bool,
}

pub struct SessionDb {
    conn: Connection,
}

impl SessionDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        schema::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Ensure a row exists for this session. Existing rows keep their
    /// created_at and name. Returns true if a row was inserted.
    pub fn create_session(&self, id: &str, name: Option<&str>) -> anyhow::Result<bool> {
        let now = Utc::now();
        let default_name = format!("Chat {}", now.format("%d.%m.%Y %H:%M"));
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO sessions
             (session_id, session_name, created_at, last_activity)
             VALUES (?1, ?2, ?3, ?3)",
            params![id, name.unwrap_or(&default_name), now.to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Mirror counts and activity from the JSON document.
    /// Returns the number of rows touched (0 when the row is missing).
    pub fn update_activity(
        &self,
        id: &str,
        message_count: usize,
        product_count: usize,
        last_activity: &str,
    ) -> anyhow::Result<usize> {
        let updated = self.conn.execute(
            "UPDATE sessions
             SET last_activity = ?1, message_count = ?2, product_count = ?3
             WHERE session_id = ?4",
            params![last_activity, message_count, product_count, id],
        )?;
        Ok(updated)
    }

    pub fn rename_session(&self, id: &str, new_name: &str) -> anyhow::Result<bool> {
        let updated = self.conn.execute(
            "UPDATE sessions SET session_name = ?1 WHERE session_id = ?2",
            params![new_name, id],
        )?;
        Ok(updated > 0)
    }

    /// Soft-deactivate a session without touching its content.
    pub fn archive_session(&self, id: &str) -> anyhow::Result<bool> {
        let updated = self.conn.execute(
            "UPDATE sessions SET is_active = 0 WHERE session_id = ?1",
            params![id],
        )?;
        Ok(updated > 0)
    }

    pub fn delete_session(&self, id: &str) -> anyhow::Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE session_id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn get_session(&self, id: &str) -> anyhow::Result<Option<SessionRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT session_id, session_name, created_at, last_activity,
                        message_count, product_count, metadata, is_active
                 FROM sessions WHERE session_id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list_sessions(&self) -> anyhow::Result<Vec<SessionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, session_name, created_at, last_activity,
                    message_count, product_count, metadata, is_active
             FROM sessions ORDER BY last_activity DESC",
        )?;

        let rows = stmt.query_map([], Self::map_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
        Ok(SessionRow {
            session_id: row.get(0)?,
            session_name: row.get(1)?,
            created_at: row.get(2)?,
            last_activity: row.get(3)?,
            message_count: row.get::<_, i64>(4)? as usize,
            product_count: row.get::<_, i64>(5)? as usize,
            metadata: row.get(6)?,
            is_active: row.get::<_, i64>(7)? != 0,
        })
    }

    /// Get a reference to the underlying connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_idempotent() {
        let db = SessionDb::in_memory().unwrap();
        assert!(db.create_session("s1", Some("First")).unwrap());
        assert!(!db.create_session("s1", Some("Renamed?")).unwrap());

        let row = db.get_session("s1").unwrap().unwrap();
        assert_eq!(row.session_name, "First");
        assert!(row.is_active);
    }

    #[test]
    fn test_default_name_assigned() {
        let db = SessionDb::in_memory().unwrap();
        db.create_session("s1", None).unwrap();
        let row = db.get_session("s1").unwrap().unwrap();
        assert!(row.session_name.starts_with("Chat "));
    }

    #[test]
    fn test_update_activity_missing_row() {
        let db = SessionDb::in_memory().unwrap();
        let touched = db
            .update_activity("ghost", 3, 1, "2026-01-01T00:00:00+00:00")
            .unwrap();
        assert_eq!(touched, 0);
    }

    #[test]
    fn test_rename_archive_delete() {
        let db = SessionDb::in_memory().unwrap();
        db.create_session("s1", None).unwrap();

        assert!(db.rename_session("s1", "Oven questions").unwrap());
        assert!(db.archive_session("s1").unwrap());

        let row = db.get_session("s1").unwrap().unwrap();
        assert_eq!(row.session_name, "Oven questions");
        assert!(!row.is_active);

        assert!(db.delete_session("s1").unwrap());
        assert!(db.get_session("s1").unwrap().is_none());
        assert!(!db.delete_session("s1").unwrap());
    }

    #[test]
    fn test_list_ordered_by_activity() {
        let db = SessionDb::in_memory().unwrap();
        db.create_session("old", None).unwrap();
        db.create_session("new", None).unwrap();
        db.update_activity("old", 1, 0, "2026-01-01T00:00:00+00:00")
            .unwrap();
        db.update_activity("new", 1, 0, "2026-06-01T00:00:00+00:00")
            .unwrap();

        let rows = db.list_sessions().unwrap();
        assert_eq!(rows[0].session_id, "new");
        assert_eq!(rows[1].session_id, "old");
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        schema::run_migrations(&conn).unwrap();
        schema::run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sessions'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
