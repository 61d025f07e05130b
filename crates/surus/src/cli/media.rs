//! Media command handlers

use surus_core::content::Entity;
use surus_core::id::ContentId;
use surus_core::media::{MediaIngestor, MediaLimits, UploadedFile, format_file_size};

use crate::cli::CliStore;
use crate::cli::args::MediaCommands;

/// Handle media commands
pub fn handle_media_command(store: &CliStore, command: MediaCommands) -> bool {
    match command {
        MediaCommands::Upload { paths } => {
            let ingestor = MediaIngestor::new(MediaLimits::default());
            let mut ok = true;
            for path in paths {
                let result =
                    UploadedFile::from_path(&path).and_then(|file| ingestor.ingest(store, file));
                match result {
                    Ok(stored) => println!(
                        "✓ {} -> {} ({})",
                        stored.original_name,
                        stored.filename,
                        format_file_size(stored.size)
                    ),
                    Err(e) => {
                        eprintln!("✗ {}: {}", path.display(), e);
                        ok = false;
                    }
                }
            }
            ok
        }

        MediaCommands::List => {
            let files = store.media_files().list();
            if files.is_empty() {
                println!("No media files yet.");
            }
            for file in &files {
                println!("{}  {}", file.id, file.label());
            }
            true
        }

        MediaCommands::Rm { id } => match store.media_files().delete(&ContentId::from(id.as_str())) {
            Ok(()) => {
                println!("✓ Removed media file {}", id);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        },
    }
}
