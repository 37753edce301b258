use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{decode_entries, EntryStore, PersistenceError, StorageHandle};
use crate::journal::Entry;

/// Key under which the whole collection is kept as one JSON array.
pub const STORAGE_KEY: &str = "symptom-journal-entries";

/// Local variant: the full entry collection serialized under a single key.
#[derive(Clone)]
pub struct LocalStore {
    storage: StorageHandle,
}

impl LocalStore {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<Vec<Entry>, PersistenceError> {
        let elements = self.storage.with_connection(|conn| {
            let raw = read_blob(conn)?;
            read_elements(raw.as_deref())
        })?;
        Ok(decode_entries(elements, STORAGE_KEY))
    }

    /// Read-modify-write of the blob inside one transaction. Elements that do
    /// not decode are written back untouched; a blob that is not an array is
    /// left alone and the write fails.
    fn modify<F>(&self, f: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        self.storage.with_connection(|conn| {
            let tx = conn.transaction()?;
            let raw = read_blob(&tx)?;
            let mut elements = read_elements(raw.as_deref()).map_err(|err| {
                tracing::error!(error = %err, key = STORAGE_KEY, "entry blob is not an array");
                err
            })?;
            if !f(&mut elements) {
                return Ok(());
            }
            let encoded = serde_json::to_string(&elements)?;
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![STORAGE_KEY, encoded],
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}

impl EntryStore for LocalStore {
    fn list(&self) -> Vec<Entry> {
        match self.load() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "reading local entries failed, treating as empty");
                Vec::new()
            }
        }
    }

    fn create(&self, entry: &Entry) -> Result<(), PersistenceError> {
        let element = serde_json::to_value(entry)?;
        self.modify(|elements| {
            elements.push(element);
            true
        })?;
        tracing::debug!(id = %entry.id, "entry stored locally");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.modify(|elements| {
            let before = elements.len();
            elements.retain(|element| element_id(element) != Some(id));
            before != elements.len()
        })
    }
}

fn read_blob(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv WHERE key = ?1",
        params![STORAGE_KEY],
        |row| row.get(0),
    )
    .optional()
}

fn read_elements(raw: Option<&str>) -> Result<Vec<Value>, PersistenceError> {
    match raw {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Vec::new()),
    }
}

fn element_id(element: &Value) -> Option<&str> {
    element
        .get("id")
        .or_else(|| element.get("_id"))
        .and_then(Value::as_str)
}
