/// Clap argument definitions
mod args;

/// Settings commands
mod config;

/// Per-collection list/show/add/edit/rm
mod content;

/// Media upload and management
mod media;

/// `surus publish`
mod publish;

/// Export, import and import-site
mod snapshot;

/// Usage, stats and clear
mod storage;

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use surus_core::config::Config;
use surus_core::error::Result;
use surus_core::storage::FileKeyValueStore;
use surus_core::store::ContentStore;

pub use args::Cli;
use args::Commands;

/// Content store backed by the data directory.
pub type CliStore = ContentStore<FileKeyValueStore>;

/// Run a future to completion on a current-thread runtime.
fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Loaded settings plus where to save them back.
pub struct Settings {
    pub config: Config,
    pub path: Option<PathBuf>,
}

impl Settings {
    fn load(path: Option<PathBuf>) -> Result<Self> {
        let config = match &path {
            Some(path) if path.exists() => Config::load_from(path)?,
            Some(_) => Config::default(),
            None => Config::load()?,
        };
        Ok(Self { config, path })
    }

    fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        }
    }

    fn open_store(&self) -> Result<CliStore> {
        let root = self.config.data_dir.join("store");
        let kv = FileKeyValueStore::open_with_capacity(root, self.config.capacity())?;
        Ok(ContentStore::new(kv))
    }
}

/// Open the local store and run a command against it.
fn with_store(settings: &Settings, run: impl FnOnce(&CliStore) -> bool) -> bool {
    match settings.open_store() {
        Ok(store) => run(&store),
        Err(e) => {
            eprintln!("✗ Failed to open local storage: {}", e);
            false
        }
    }
}

/// Ask a yes/no question on the terminal. Defaults to no.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let mut settings = match Settings::load(cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("✗ Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let success = match cli.command {
        Commands::Config { command } => config::handle_config_command(command, &mut settings),
        Commands::Blog { command } => with_store(&settings, |store| {
            content::handle_collection_command(store.blog_posts(), command)
        }),
        Commands::Podcast { command } => with_store(&settings, |store| {
            content::handle_collection_command(store.podcast_episodes(), command)
        }),
        Commands::Team { command } => with_store(&settings, |store| {
            content::handle_collection_command(store.team_members(), command)
        }),
        Commands::Media { command } => {
            with_store(&settings, |store| media::handle_media_command(store, command))
        }
        Commands::Usage => with_store(&settings, storage::handle_usage),
        Commands::Stats => with_store(&settings, storage::handle_stats),
        Commands::Export { output } => {
            with_store(&settings, |store| snapshot::handle_export(store, output))
        }
        Commands::Import { file } => {
            with_store(&settings, |store| snapshot::handle_import(store, &file))
        }
        Commands::ImportSite { dir } => {
            with_store(&settings, |store| snapshot::handle_import_site(store, &dir))
        }
        Commands::Publish { media, dry_run } => with_store(&settings, |store| {
            publish::handle_publish(store, &settings.config, media, dry_run)
        }),
        Commands::Clear { yes } => with_store(&settings, |store| storage::handle_clear(store, yes)),
    };

    if !success {
        std::process::exit(1);
    }
}
