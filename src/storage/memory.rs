use parking_lot::Mutex;

use super::{EntryStore, PersistenceError};
use crate::journal::Entry;

/// In-process store. Nothing outlives the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl EntryStore for MemoryStore {
    fn list(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    fn create(&self, entry: &Entry) -> Result<(), PersistenceError> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.entries.lock().retain(|entry| entry.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;

    #[test]
    fn memory_store_satisfies_entry_store_contract() {
        conformance::exercise(&MemoryStore::new());
    }

    #[test]
    fn seeded_entries_are_listed_in_order() {
        let store = MemoryStore::with_entries(vec![
            conformance::entry("x", 1),
            conformance::entry("y", 2),
        ]);
        let ids: Vec<_> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["x", "y"]);
    }
}
