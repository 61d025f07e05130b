//! Export, import and import-site handlers

use std::path::{Path, PathBuf};

use surus_core::publish::{SiteImport, import_site};
use surus_core::store::Snapshot;

use crate::cli::CliStore;

/// Write every collection into one snapshot document
pub fn handle_export(store: &CliStore, output: Option<PathBuf>) -> bool {
    let json = match store.export_snapshot().to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    match output {
        None => {
            println!("{}", json);
            true
        }
        Some(path) => match std::fs::write(&path, json) {
            Ok(()) => {
                let summary = store.summary();
                println!(
                    "✓ Exported {} blog posts, {} podcast episodes, {} team members and {} media files to {}",
                    summary.blog_posts,
                    summary.podcast_episodes,
                    summary.team_members,
                    summary.media_files,
                    path.display()
                );
                true
            }
            Err(e) => {
                eprintln!("✗ Failed to write {}: {}", path.display(), e);
                false
            }
        },
    }
}

/// Restore collections present in a snapshot, overwriting them wholesale
pub fn handle_import(store: &CliStore, file: &Path) -> bool {
    let snapshot = match std::fs::read_to_string(file)
        .map_err(|e| e.to_string())
        .and_then(|raw| Snapshot::from_json(&raw).map_err(|e| e.to_string()))
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("✗ Could not read snapshot {}: {}", file.display(), e);
            return false;
        }
    };

    match store.import_snapshot(&snapshot) {
        Ok(summary) => {
            println!(
                "✓ Imported {} blog posts, {} podcast episodes, {} team members, {} media files",
                summary.blog_posts,
                summary.podcast_episodes,
                summary.team_members,
                summary.media_files
            );
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Pull the published JSON documents back into local drafts
pub fn handle_import_site(store: &CliStore, dir: &Path) -> bool {
    let import = match SiteImport::from_dir(dir) {
        Ok(import) => import,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if import.blog.is_none() && import.podcast.is_none() && import.team.is_none() {
        eprintln!("✗ No blog.json, podcast.json or team.json in {}", dir.display());
        return false;
    }

    match import_site(store, import) {
        Ok(summary) => {
            println!(
                "✓ Imported {} blog posts, {} podcast episodes, {} team members",
                summary.blog_posts, summary.podcast_episodes, summary.team_members
            );
            if summary.skipped > 0 {
                println!("  {} malformed items skipped", summary.skipped);
            }
            if summary.duplicates > 0 {
                println!("  {} items already present", summary.duplicates);
            }
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
