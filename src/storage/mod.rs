use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::StorageOptions;
use crate::journal::Entry;

mod documents;
mod local;
mod memory;
mod remote;
mod schema;

pub use documents::DocumentStore;
pub use local::{LocalStore, STORAGE_KEY};
pub use memory::MemoryStore;
pub use remote::RemoteStore;

/// Failure to read or write the backing medium. Retrying the same action is safe.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

/// Persistence contract shared by the local, remote and in-memory variants.
///
/// `list` never fails: an unreadable medium yields an empty collection and a
/// warning. Entries come back in stored order; callers sort. Deleting an id
/// that does not exist succeeds without changing anything.
pub trait EntryStore {
    fn list(&self) -> Vec<Entry>;

    fn create(&self, entry: &Entry) -> Result<(), PersistenceError>;

    fn delete(&self, id: &str) -> Result<(), PersistenceError>;
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&*self.db_path)?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }
}

pub fn init(db_path: &Path, storage: &StorageOptions) -> Result<StorageHandle> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)
        .with_context(|| format!("configuring database {}", db_path.display()))?;
    schema::apply(&conn)?;
    tracing::debug!(path = %db_path.display(), "storage initialised");
    Ok(StorageHandle {
        db_path: Arc::new(db_path.to_path_buf()),
        options: Arc::new(storage.clone()),
    })
}

/// Decodes each element on its own so one unreadable document does not hide the rest.
pub(crate) fn decode_entries(elements: Vec<serde_json::Value>, source: &str) -> Vec<Entry> {
    elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value::<Entry>(element) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(index, source, error = %err, "skipping unreadable entry");
                None
            }
        })
        .collect()
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )?;
    Ok(())
}
