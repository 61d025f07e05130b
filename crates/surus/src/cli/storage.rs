//! Usage, stats and clear handlers

use surus_core::content::CollectionKind;
use surus_core::storage::StorageHealth;

use crate::cli::{CliStore, confirm};

/// Show how full the local area is
pub fn handle_usage(store: &CliStore) -> bool {
    let usage = match store.usage() {
        Ok(usage) => usage,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let health = match usage.health() {
        StorageHealth::Good => "good",
        StorageHealth::Moderate => "moderate",
        StorageHealth::Critical => "critical, publish content to free space",
    };

    println!("Local storage");
    println!("=============");
    println!(
        "Used:      {} of {} characters ({}%)",
        usage.used,
        usage.total,
        usage.percent()
    );
    println!("Available: {} characters", usage.available);
    println!("Health:    {}", health);

    let summary = store.summary();
    println!();
    for kind in CollectionKind::ALL {
        println!("{:<17}{}", format!("{}:", kind.plural()), summary.get(kind));
    }
    true
}

/// Show published and draft counts
pub fn handle_stats(store: &CliStore) -> bool {
    let stats = store.publish_stats();
    println!("Published: {}", stats.published);
    println!("Drafts:    {}", stats.draft);
    println!("Total:     {}", stats.total);
    true
}

/// Delete every collection after confirmation
pub fn handle_clear(store: &CliStore, yes: bool) -> bool {
    if !yes && !confirm("Delete all local content? Unpublished drafts will be lost.") {
        println!("Cancelled.");
        return true;
    }

    match store.clear_all() {
        Ok(()) => {
            println!("✓ Local content cleared.");
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
