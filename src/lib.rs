pub mod cli;
pub mod config;
pub mod form;
pub mod journal;
pub mod server;
pub mod storage;
pub mod trends;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use form::{FormController, SubmitOutcome};
pub use journal::{Category, Entry, Severity, TimeOfDay};
pub use storage::{EntryStore, PersistenceError};
pub use trends::{TrendsQuery, TrendsView};
