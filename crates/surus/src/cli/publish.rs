//! Publish command handler

use surus_core::config::Config;
use surus_core::publish::{
    DEFAULT_MEDIA_DIR, DirectorySink, PublishMode, PublishReport, PublishStatus, Publisher,
    SiteDocument,
};
use surus_core::remote::{GitHubRepository, RemoteRepository};
use surus_core::storage::FileKeyValueStore;

use crate::cli::{CliStore, block_on};

/// Handle `surus publish [--media] [--dry-run]`
pub fn handle_publish(store: &CliStore, config: &Config, media: bool, dry_run: bool) -> bool {
    let publisher = Publisher::new(store).with_content_dir(&config.content_dir);

    if dry_run {
        return show_plan(&publisher, store, media);
    }

    let remote = config.configured_remote().cloned().map(GitHubRepository::new);
    let remote = remote.as_ref().map(|r| r as &dyn RemoteRepository);

    let result = if media {
        block_on(publisher.publish_media(remote))
    } else {
        let sink = DirectorySink::new(config.download_dir());
        block_on(publisher.publish(remote, &sink))
    };

    match result {
        Ok(Ok(report)) => print_report(&report),
        Ok(Err(e)) => {
            eprintln!("✗ {}", e);
            if media && remote.is_none() {
                eprintln!(
                    "  Configure one with: surus config set --owner <owner> --repo <repo> --token <token>"
                );
            }
            false
        }
        Err(e) => {
            eprintln!("✗ Could not start the async runtime: {}", e);
            false
        }
    }
}

/// List the files a publish would write without contacting the remote
fn show_plan(publisher: &Publisher<'_, FileKeyValueStore>, store: &CliStore, media: bool) -> bool {
    let documents = match publisher.render_all() {
        Ok(documents) => documents,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    println!("Would publish:");
    for document in &documents {
        if media && document.document != SiteDocument::Media {
            continue;
        }
        println!("  {} ({} bytes)", document.path, document.contents.len());
    }
    if media {
        for file in store.media_files().list() {
            println!("  {}/{} ({} bytes)", DEFAULT_MEDIA_DIR, file.filename, file.size);
        }
    }
    true
}

fn print_report(report: &PublishReport) -> bool {
    for file in &report.files {
        if file.success {
            println!("✓ {}", file.path);
        } else {
            eprintln!(
                "✗ {}: {}",
                file.path,
                file.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    println!("{}", report.message);
    if report.mode == PublishMode::DownloadFallback {
        println!("These files were NOT published. Upload them to the site repository by hand.");
    }

    report.status == PublishStatus::Published
}
