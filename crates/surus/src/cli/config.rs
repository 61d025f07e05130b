//! Config command handlers

use surus_core::config::{Config, RemotePatch};
use surus_core::remote::{GitHubRepository, RemoteRepository};

use crate::cli::args::ConfigCommands;
use crate::cli::{Settings, block_on};

pub fn handle_config_command(command: Option<ConfigCommands>, settings: &mut Settings) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => {
            show_config(settings);
            true
        }

        Some(ConfigCommands::Set {
            token,
            owner,
            repo,
            branch,
            api_url,
            content_dir,
            capacity,
            download_dir,
        }) => {
            let config = &mut settings.config;
            if token.is_some()
                || owner.is_some()
                || repo.is_some()
                || branch.is_some()
                || api_url.is_some()
            {
                config.merge_remote(RemotePatch {
                    token,
                    owner,
                    repo,
                    branch,
                    api_url,
                });
            }
            if let Some(dir) = content_dir {
                config.content_dir = dir.trim_end_matches('/').to_string();
            }
            if let Some(capacity) = capacity {
                config.storage_capacity = Some(capacity);
            }
            if let Some(dir) = download_dir {
                config.download_dir = Some(dir);
            }
            save(settings)
        }

        Some(ConfigCommands::ClearRemote) => {
            settings.config.clear_remote();
            save(settings)
        }

        Some(ConfigCommands::Validate) => validate(&settings.config),
    }
}

fn save(settings: &Settings) -> bool {
    match settings.save() {
        Ok(()) => {
            println!("✓ Settings saved.");
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to save settings: {}", e);
            false
        }
    }
}

/// Show current settings, with the token masked
fn show_config(settings: &Settings) {
    let config = &settings.config;
    println!("Surus Configuration");
    println!("===================");
    if let Some(path) = settings.path.clone().or_else(Config::config_path) {
        println!("Config file:      {}", path.display());
    }
    println!("Data directory:   {}", config.data_dir.display());
    println!("Capacity:         {} characters", config.capacity());
    println!("Content dir:      {}", config.content_dir);
    println!("Download dir:     {}", config.download_dir().display());
    println!();

    match &config.remote {
        Some(remote) => {
            println!("Repository:       {}", remote.repository());
            println!("Branch:           {}", remote.branch);
            println!("API:              {}", remote.api_base());
            println!("Token:            {}", remote.masked_token());
            if !remote.is_configured() {
                println!();
                println!("Repository settings are incomplete; publishing will save downloads instead.");
            }
        }
        None => {
            println!("No repository configured; publishing will save downloads instead.");
        }
    }
}

/// Check the configured token can push
fn validate(config: &Config) -> bool {
    let Some(remote) = config.configured_remote() else {
        eprintln!("✗ No repository configured.");
        return false;
    };

    let repository = GitHubRepository::new(remote.clone());
    match block_on(repository.validate_access()) {
        Ok(Ok(())) => {
            println!("✓ Token can push to {}", repository.describe());
            true
        }
        Ok(Err(e)) => {
            eprintln!("✗ {}", e);
            false
        }
        Err(e) => {
            eprintln!("✗ Could not start the async runtime: {}", e);
            false
        }
    }
}
