//! Media ingestion.
//!
//! Turns an uploaded file into a [`MediaFile`] stored inline as a base64 data
//! URL. Uploads are checked against a MIME allow-list and size ceilings
//! before anything is written. Images are downsampled and re-encoded as JPEG
//! first, since inline base64 grows every byte by a third and the storage area
//! only holds a few megabytes.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::{debug, info, warn};

use crate::content::{Entity, MediaFile, NewMediaFile};
use crate::error::{CmsError, Result};
use crate::id::ContentId;
use crate::storage::KeyValueStore;
use crate::store::{Collection, ContentStore};

const MIB: u64 = 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "audio/mpeg",
    "audio/wav",
    "application/pdf",
];

/// Size and shape limits applied during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    /// Ceiling for non-image files (stored as-is)
    pub max_file_bytes: u64,
    /// Largest image accepted before compression
    pub max_image_input_bytes: u64,
    /// Ceiling for the stored (compressed) image
    pub max_image_bytes: u64,
    /// Neither image dimension exceeds this after downsampling
    pub max_dimension: u32,
    /// JPEG quality used when re-encoding images
    pub jpeg_quality: u8,
    /// Above this many stored files, older ones are evicted on upload
    pub soft_cap: usize,
    /// How many recent files survive that eviction
    pub keep_after_cleanup: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 2 * MIB,
            max_image_input_bytes: 10 * MIB,
            max_image_bytes: MIB,
            max_dimension: 800,
            jpeg_quality: 70,
            soft_cap: 20,
            keep_after_cleanup: 10,
        }
    }
}

/// A file selected by the operator.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as selected by the operator
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wrap raw bytes with their name and declared type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| CmsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = mime_from_extension(&name)
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self::new(name, mime_type, bytes))
    }

    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// MIME type for an allowed file extension.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Validates, compresses and stores uploads.
#[derive(Debug, Clone, Default)]
pub struct MediaIngestor {
    limits: MediaLimits,
}

impl MediaIngestor {
    /// Create an ingestor enforcing `limits`.
    pub fn new(limits: MediaLimits) -> Self {
        Self { limits }
    }

    /// Limits in effect.
    pub fn limits(&self) -> &MediaLimits {
        &self.limits
    }

    /// Reject files with a disallowed type or an input size over the ceiling.
    pub fn validate(&self, file: &UploadedFile) -> Result<()> {
        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(CmsError::validation(format!(
                "File type not supported: {}",
                file.mime_type
            )));
        }

        let size = file.bytes.len() as u64;
        let limit = if file.is_image() {
            self.limits.max_image_input_bytes
        } else {
            self.limits.max_file_bytes
        };
        if size > limit {
            return Err(CmsError::validation(format!(
                "File size {} exceeds the {} limit",
                format_file_size(size),
                format_file_size(limit)
            )));
        }
        Ok(())
    }

    /// Validate the upload and build the draft that will be stored.
    ///
    /// Images are always replaced by their downsampled JPEG; the original
    /// bytes are kept only when decoding fails. The stored image must fit under
    /// [`MediaLimits::max_image_bytes`].
    pub fn prepare(&self, file: UploadedFile) -> Result<NewMediaFile> {
        self.validate(&file)?;

        let UploadedFile {
            name,
            mut mime_type,
            mut bytes,
        } = file;

        if mime_type.starts_with("image/") {
            match compress_image(&bytes, &self.limits) {
                Ok(compressed) => {
                    debug!(
                        "Compressed {} from {} to {}",
                        name,
                        format_file_size(bytes.len() as u64),
                        format_file_size(compressed.len() as u64)
                    );
                    bytes = compressed;
                    mime_type = "image/jpeg".to_string();
                }
                Err(e) => warn!("Image compression failed for {}, using original: {}", name, e),
            }

            let size = bytes.len() as u64;
            if size > self.limits.max_image_bytes {
                return Err(CmsError::validation(format!(
                    "Image is {} after compression, over the {} limit. Please use a smaller image.",
                    format_file_size(size),
                    format_file_size(self.limits.max_image_bytes)
                )));
            }
        }

        Ok(NewMediaFile {
            data_url: encode_data_url(&mime_type, &bytes),
            size: bytes.len() as u64,
            original_name: name,
            mime_type,
        })
    }

    /// Validate, compress and store an upload.
    pub fn ingest<S: KeyValueStore>(
        &self,
        store: &ContentStore<S>,
        file: UploadedFile,
    ) -> Result<MediaFile> {
        let draft = self.prepare(file)?;
        let stored = store.media_files().store_upload(draft, &self.limits)?;
        info!("Stored {} as {}", stored.original_name, stored.filename);
        Ok(stored)
    }
}

impl<S: KeyValueStore> Collection<'_, S, MediaFile> {
    /// Add an upload, replacing a stored file with the same original name.
    ///
    /// When more than [`MediaLimits::soft_cap`] files are stored, only the
    /// most recently uploaded [`MediaLimits::keep_after_cleanup`] are kept.
    pub fn store_upload(&self, draft: NewMediaFile, limits: &MediaLimits) -> Result<MediaFile> {
        let mut rows = self.list();

        if rows.len() > limits.soft_cap {
            rows.sort_by_key(|f| std::cmp::Reverse(f.uploaded_at));
            rows.truncate(limits.keep_after_cleanup);
            warn!(
                "Media library over {} files, kept the {} most recent",
                limits.soft_cap, limits.keep_after_cleanup
            );
        }

        let now = Utc::now();
        let id = match rows
            .iter_mut()
            .find(|f| f.original_name == draft.original_name)
        {
            Some(existing) => {
                debug!("Replacing media file {}", existing.original_name);
                existing.filename = MediaFile::generated_filename(
                    &existing.id,
                    &draft.original_name,
                    &draft.mime_type,
                );
                existing.data_url = draft.data_url;
                existing.mime_type = draft.mime_type;
                existing.size = draft.size;
                existing.uploaded_at = now;
                existing.touch(now);
                existing.id.clone()
            }
            None => {
                let file = MediaFile::from_draft(ContentId::generate(), draft, now);
                let id = file.id.clone();
                rows.push(file);
                id
            }
        };

        self.commit(rows, &id)
    }
}

/// Downsample an image to fit the dimension limit and re-encode it as JPEG.
pub fn compress_image(bytes: &[u8], limits: &MediaLimits) -> image::ImageResult<Vec<u8>> {
    let mut img = image::load_from_memory(bytes)?;

    let max = limits.max_dimension;
    if img.width() > max || img.height() > max {
        img = img.resize(max, max, FilterType::Triangle);
    }

    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, limits.jpeg_quality).encode_image(&rgb)?;
    Ok(out.into_inner())
}

/// `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}

/// Human-readable size ("0 Bytes", "1.5 KB", "2 MB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use image::{ImageBuffer, ImageFormat, Rgb};

    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn png(width: u32, height: u32, noisy: bool) -> Vec<u8> {
        let mut seed: u32 = 0x2545_f491;
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            if noisy {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let [_, r, g, b] = seed.to_le_bytes();
                Rgb([r, g, b])
            } else {
                Rgb([(x % 256) as u8, (y % 256) as u8, 128])
            }
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let ingestor = MediaIngestor::default();
        let err = ingestor
            .prepare(UploadedFile::new("notes.txt", "text/plain", b"hi".to_vec()))
            .unwrap_err();
        assert!(matches!(err, CmsError::Validation(_)));
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_rejects_oversized_non_image() {
        let ingestor = MediaIngestor::default();
        let bytes = vec![0u8; (2 * MIB + 1) as usize];
        let err = ingestor
            .prepare(UploadedFile::new("talk.mp3", "audio/mpeg", bytes))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the 2 MB limit"));
    }

    #[test]
    fn test_non_image_stored_verbatim() {
        let ingestor = MediaIngestor::default();
        let draft = ingestor
            .prepare(UploadedFile::new("deck.pdf", "application/pdf", b"%PDF-1.4".to_vec()))
            .unwrap();
        assert_eq!(draft.mime_type, "application/pdf");
        assert_eq!(draft.size, 8);
        assert_eq!(
            parse_data_url(&draft.data_url),
            Some(("application/pdf".to_string(), b"%PDF-1.4".to_vec()))
        );
    }

    #[test]
    fn test_large_image_is_downsampled_to_jpeg() {
        let ingestor = MediaIngestor::default();
        let draft = ingestor
            .prepare(UploadedFile::new("banner.png", "image/png", png(1600, 1200, false)))
            .unwrap();

        assert_eq!(draft.mime_type, "image/jpeg");
        let (_, bytes) = parse_data_url(&draft.data_url).unwrap();
        assert_eq!(bytes.len() as u64, draft.size);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[test]
    fn test_small_image_is_reencoded_even_if_it_grows() {
        // A flat 4x4 PNG is smaller than any JPEG of it
        let original = png(4, 4, false);
        let draft = MediaIngestor::default()
            .prepare(UploadedFile::new("dot.png", "image/png", original))
            .unwrap();
        assert_eq!(draft.mime_type, "image/jpeg");
        let (mime, _) = parse_data_url(&draft.data_url).unwrap();
        assert_eq!(mime, "image/jpeg");
    }

    #[test]
    fn test_undecodable_image_falls_back_to_original_bytes() {
        let ingestor = MediaIngestor::default();
        let draft = ingestor
            .prepare(UploadedFile::new("broken.png", "image/png", b"not a png".to_vec()))
            .unwrap();
        assert_eq!(draft.mime_type, "image/png");
        assert_eq!(draft.size, 9);
    }

    #[test]
    fn test_three_megabyte_image_stored_under_ceiling_or_rejected() {
        let bytes = png(1000, 1000, true);
        assert!(bytes.len() as u64 > 2 * MIB);

        let store = ContentStore::new(MemoryKeyValueStore::new());
        let ingestor = MediaIngestor::default();
        match ingestor.ingest(&store, UploadedFile::new("noise.png", "image/png", bytes)) {
            Ok(file) => assert!(file.size <= ingestor.limits().max_image_bytes),
            Err(e) => assert!(matches!(e, CmsError::Validation(_))),
        }
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let ingestor = MediaIngestor::default();
        let first = ingestor
            .ingest(&store, UploadedFile::new("deck.pdf", "application/pdf", b"v1".to_vec()))
            .unwrap();
        let second = ingestor
            .ingest(&store, UploadedFile::new("deck.pdf", "application/pdf", b"v2!".to_vec()))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.size, 3);
        assert!(second.updated_at.is_some());
        assert_eq!(store.media_files().count(), 1);
    }

    #[test]
    fn test_soft_cap_keeps_most_recent_uploads() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let base = Utc::now() - Duration::days(30);
        let rows: Vec<MediaFile> = (0..21)
            .map(|i| {
                MediaFile::from_draft(
                    ContentId::from(format!("m{}", i)),
                    NewMediaFile {
                        original_name: format!("file{}.pdf", i),
                        data_url: encode_data_url("application/pdf", b"x"),
                        mime_type: "application/pdf".to_string(),
                        size: 1,
                    },
                    base + Duration::hours(i),
                )
            })
            .collect();
        store.media_files().replace_all(&rows).unwrap();

        MediaIngestor::default()
            .ingest(&store, UploadedFile::new("new.pdf", "application/pdf", b"y".to_vec()))
            .unwrap();

        let stored = store.media_files().list();
        assert_eq!(stored.len(), 11);
        assert!(stored.iter().any(|f| f.original_name == "new.pdf"));
        assert!(stored.iter().any(|f| f.id.as_str() == "m20"));
        assert!(!stored.iter().any(|f| f.id.as_str() == "m10"));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("Photo.JPG"), Some("image/jpeg"));
        assert_eq!(mime_from_extension("episode.mp3"), Some("audio/mpeg"));
        assert_eq!(mime_from_extension("archive.zip"), None);
        assert_eq!(mime_from_extension("noext"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * MIB), "2 MB");
        assert_eq!(format_file_size(1500), "1.46 KB");
    }
}
