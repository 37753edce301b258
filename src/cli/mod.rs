use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, ConfigLoader, ConfigPaths, StoreBackend, CONFIG_ENV, DATA_ENV};
use crate::storage::{self, EntryStore, LocalStore, RemoteStore};

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, ListArgs, ServeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "symptom-journal",
    version,
    about = "Log symptoms and review how they trend over time"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over SYMPTOM_JOURNAL_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over SYMPTOM_JOURNAL_DATA)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use the remote backend at this URL instead of the configured store
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a new symptom entry
    Add(AddArgs),
    /// Show summary statistics and the filtered, sorted entry list (default)
    List(ListArgs),
    /// Print the severity-over-time series
    Trend,
    /// Permanently delete an entry by id
    Delete(DeleteArgs),
    /// Show the symptom category reference table
    Categories,
    /// Run the HTTP backend for the remote store
    Serve(ServeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    let remote = cli.remote.as_deref();
    let command = cli.command.unwrap_or(Commands::List(ListArgs::default()));
    match command {
        Commands::Add(args) => {
            let store = open_store(&config, &paths, remote)?;
            commands::add_entry(store.as_ref(), args)
        }
        Commands::List(args) => {
            let store = open_store(&config, &paths, remote)?;
            commands::list_entries(&config, store.as_ref(), args)
        }
        Commands::Trend => {
            let store = open_store(&config, &paths, remote)?;
            commands::print_trend(store.as_ref())
        }
        Commands::Delete(args) => {
            let store = open_store(&config, &paths, remote)?;
            commands::delete_entry(store.as_ref(), args)
        }
        Commands::Categories => commands::print_categories(),
        Commands::Serve(args) => commands::serve(&config, args),
    }
}

/// Builds the store once per process from config; `--remote` wins over the file.
pub fn open_store(
    config: &AppConfig,
    paths: &ConfigPaths,
    remote_override: Option<&str>,
) -> Result<Box<dyn EntryStore>> {
    let remote_url = match (remote_override, config.store.backend) {
        (Some(url), _) => Some(url),
        (None, StoreBackend::Remote) => Some(config.store.remote_url.as_str()),
        (None, StoreBackend::Local) => None,
    };
    if let Some(url) = remote_url {
        tracing::debug!(%url, "using remote entry store");
        let store = RemoteStore::new(url).with_context(|| format!("configuring remote store {url}"))?;
        return Ok(Box::new(store));
    }
    let db_path = if config.storage.database_path.as_os_str().is_empty() {
        paths.database_path.clone()
    } else {
        config.storage.database_path.clone()
    };
    let handle = storage::init(&db_path, &config.storage)?;
    Ok(Box::new(LocalStore::new(handle)))
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
