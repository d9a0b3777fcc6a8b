// src/catalog/mod.rs — Read-only product manual catalog
//
// The retailer's products database is maintained by the scraping side of the
// system; this crate only ever reads it. A row is interesting here when it
// carries a manual_path.

pub mod locator;

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::infra::errors::AftersalesError;

/// One product with a stored manual.
#[derive(Debug, Clone)]
pub struct ManualRecord {
    pub name: String,
    pub model_number: String,
    pub manual_path: String,
}

/// In-memory snapshot of the manual catalog.
pub struct Catalog {
    records: Vec<ManualRecord>,
    manuals_root: PathBuf,
}

impl Catalog {
    /// Load every product row that has a manual on file. The database is
    /// opened read-only; this crate never writes to it.
    pub fn load(db_path: &Path, manuals_root: PathBuf) -> Result<Self, AftersalesError> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut stmt = conn.prepare(
            "SELECT name, model_number, manual_path FROM products
             WHERE manual_path IS NOT NULL AND manual_path != ''",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ManualRecord {
                name: row.get(0)?,
                model_number: row.get(1)?,
                manual_path: row.get(2)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        debug!(count = records.len(), "manual catalog loaded");
        Ok(Self {
            records,
            manuals_root,
        })
    }

    /// Build a catalog from records directly (tests, fixtures).
    pub fn from_records(records: Vec<ManualRecord>, manuals_root: PathBuf) -> Self {
        Self {
            records,
            manuals_root,
        }
    }

    pub fn records(&self) -> &[ManualRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a record's manual path against the manuals root.
    pub fn resolve_path(&self, record: &ManualRecord) -> PathBuf {
        let path = Path::new(&record.manual_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.manuals_root.join(path)
        }
    }

    /// Locate the best-matching record and its on-disk manual. A catalog hit
    /// whose file is missing is a normal not-found outcome, not an error.
    pub fn locate_manual(
        &self,
        query: &str,
    ) -> Result<Option<(&ManualRecord, PathBuf)>, AftersalesError> {
        let Some(record) = locator::locate(&self.records, query)? else {
            return Ok(None);
        };

        let path = self.resolve_path(record);
        if !path.exists() {
            warn!(
                product = %record.name,
                path = %path.display(),
                "catalog references a manual that is missing on disk"
            );
            return Ok(None);
        }
        Ok(Some((record, path)))
    }
}
