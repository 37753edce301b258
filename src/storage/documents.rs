use rusqlite::params;
use time::OffsetDateTime;

use super::{PersistenceError, StorageHandle};
use crate::journal::{generate_id, Entry, NewEntry};

/// Document table behind the HTTP backend. The store assigns identities.
#[derive(Clone)]
pub struct DocumentStore {
    storage: StorageHandle,
}

impl DocumentStore {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }

    pub fn find_all(&self) -> Result<Vec<Entry>, PersistenceError> {
        self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id, body FROM documents ORDER BY seq")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            let mut entries = Vec::with_capacity(rows.len());
            for (id, body) in rows {
                match serde_json::from_str::<NewEntry>(&body) {
                    Ok(doc) => entries.push(doc.with_id(id)),
                    Err(err) => {
                        tracing::warn!(%id, error = %err, "skipping unreadable document");
                    }
                }
            }
            Ok(entries)
        })
    }

    pub fn insert(&self, doc: NewEntry) -> Result<Entry, PersistenceError> {
        let body = serde_json::to_string(&doc)?;
        let id = generate_id();
        self.storage.with_connection(|conn| {
            conn.execute(
                "INSERT INTO documents (id, body, inserted_at) VALUES (?1, ?2, ?3)",
                params![id, body, OffsetDateTime::now_utc().unix_timestamp()],
            )?;
            Ok::<_, PersistenceError>(())
        })?;
        Ok(doc.with_id(id))
    }

    /// Returns the number of removed documents; zero for an unknown id.
    pub fn delete_one(&self, id: &str) -> Result<usize, PersistenceError> {
        self.storage.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
            Ok(removed)
        })
    }
}
