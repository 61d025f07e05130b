//! Publish reconciler.
//!
//! Turns the local drafts into the exact JSON documents the public site reads
//! (`blog.json`, `podcast.json`, `team.json`, `media.json`) and pushes them to
//! the remote repository, one hash-conditioned commit per file. Without a
//! configured remote the documents are handed to a [`DownloadSink`] instead,
//! and the report says so.
//!
//! Shaping rules:
//!
//! - only published posts and episodes, and only active team members, are emitted
//! - blog posts newest first, episodes by number descending, team by order ascending
//! - absent or empty optional fields are omitted
//! - legacy field copies come from the single table in [`LEGACY_ALIASES`]
//!
//! ```ignore
//! let publisher = Publisher::new(&store).with_content_dir(&config.content_dir);
//! let report = publisher.publish(remote.as_deref(), &DirectorySink::new(dir)).await?;
//! println!("{}", report.message);
//! ```

mod aliases;
mod import;
mod sink;
mod types;

pub use aliases::{LEGACY_ALIASES, LegacyAlias, add_legacy_fields, resolve_legacy_fields};
pub use import::{ImportSummary, SiteImport, import_site};
#[cfg(not(target_arch = "wasm32"))]
pub use sink::DirectorySink;
pub use sink::DownloadSink;
pub use types::{
    MEDIA_PUBLIC_DIR, SiteBlogPost, SiteMediaEntry, SitePodcastEpisode, SiteTeamMember,
};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use ts_rs::TS;

use crate::config::DEFAULT_CONTENT_DIR;
use crate::content::{BlogPost, CollectionKind, MediaFile, PodcastEpisode, TeamMember};
use crate::error::{CmsError, Result};
use crate::media::parse_data_url;
use crate::remote::{RemoteError, RemoteRepository, commit_message};
use crate::storage::KeyValueStore;
use crate::store::ContentStore;

/// Repository-relative directory media bytes are committed to.
pub const DEFAULT_MEDIA_DIR: &str = "public/images/uploads";

/// One of the documents the public site reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum SiteDocument {
    /// `blog.json`
    Blog,
    /// `podcast.json`
    Podcast,
    /// `team.json`
    Team,
    /// `media.json`
    Media,
}

impl SiteDocument {
    /// All documents, in publish order.
    pub const ALL: [SiteDocument; 4] = [
        SiteDocument::Blog,
        SiteDocument::Podcast,
        SiteDocument::Team,
        SiteDocument::Media,
    ];

    /// Base name without extension ("blog").
    pub fn stem(self) -> &'static str {
        match self {
            SiteDocument::Blog => "blog",
            SiteDocument::Podcast => "podcast",
            SiteDocument::Team => "team",
            SiteDocument::Media => "media",
        }
    }

    /// File name inside the content directory ("blog.json").
    pub fn file_name(self) -> String {
        format!("{}.json", self.stem())
    }

    /// Collection the document is built from.
    pub fn kind(self) -> CollectionKind {
        match self {
            SiteDocument::Blog => CollectionKind::BlogPosts,
            SiteDocument::Podcast => CollectionKind::PodcastEpisodes,
            SiteDocument::Team => CollectionKind::TeamMembers,
            SiteDocument::Media => CollectionKind::MediaFiles,
        }
    }
}

/// A document rendered and ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Which site document this is
    pub document: SiteDocument,
    /// Repository-relative path
    pub path: String,
    /// Pretty-printed JSON
    pub contents: String,
}

/// Where a publish sent its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PublishMode {
    /// Committed to the remote repository
    Remote,
    /// No remote configured: saved locally for manual upload
    DownloadFallback,
}

/// Overall outcome of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PublishStatus {
    /// Every file went through
    Published,
    /// Some files went through, others failed
    Partial,
    /// Nothing went through
    Failed,
}

/// Outcome for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FileOutcome {
    /// Repository-relative path
    pub path: String,
    /// Whether the file was written
    pub success: bool,
    /// New remote hash, or the local location for downloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remote status code of a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FileOutcome {
    fn succeeded(path: &str, location: String) -> Self {
        Self {
            path: path.to_string(),
            success: true,
            location: Some(location),
            error: None,
            status: None,
        }
    }

    fn failed(path: &str, error: String, status: Option<u16>) -> Self {
        Self {
            path: path.to_string(),
            success: false,
            location: None,
            error: Some(error),
            status,
        }
    }

    fn remote_failure(path: &str, error: &RemoteError) -> Self {
        Self::failed(path, error.to_string(), error.status())
    }
}

/// Result of a publish, reported file by file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PublishReport {
    /// Remote commit or download fallback
    pub mode: PublishMode,
    /// Overall outcome
    pub status: PublishStatus,
    /// Human-readable outcome
    pub message: String,
    /// Per-file outcomes
    pub files: Vec<FileOutcome>,
}

impl PublishReport {
    /// Whether every file reached the remote repository.
    pub fn is_remote_success(&self) -> bool {
        self.mode == PublishMode::Remote && self.status == PublishStatus::Published
    }

    /// Paths that went through.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter(|f| f.success).map(|f| f.path.as_str())
    }

    /// Files that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.success)
    }

    fn status_of(files: &[FileOutcome]) -> PublishStatus {
        let ok = files.iter().filter(|f| f.success).count();
        if ok == files.len() {
            PublishStatus::Published
        } else if ok == 0 {
            PublishStatus::Failed
        } else {
            PublishStatus::Partial
        }
    }

    fn failure_list(files: &[FileOutcome]) -> String {
        files
            .iter()
            .filter(|f| !f.success)
            .map(|f| format!("{} ({})", f.path, f.error.as_deref().unwrap_or("unknown error")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn remote(target: &str, files: Vec<FileOutcome>) -> Self {
        let status = Self::status_of(&files);
        let ok = files.iter().filter(|f| f.success).count();
        let message = match status {
            PublishStatus::Published => {
                format!("Published {} files to {}.", files.len(), target)
            }
            PublishStatus::Partial => format!(
                "Published {} of {} files to {}. Failed: {}",
                ok,
                files.len(),
                target,
                Self::failure_list(&files)
            ),
            PublishStatus::Failed => format!(
                "Publishing to {} failed: {}",
                target,
                Self::failure_list(&files)
            ),
        };
        Self {
            mode: PublishMode::Remote,
            status,
            message,
            files,
        }
    }

    fn access_denied(target: &str, error: &RemoteError) -> Self {
        Self {
            mode: PublishMode::Remote,
            status: PublishStatus::Failed,
            message: format!("Remote access validation failed for {}: {}", target, error),
            files: Vec::new(),
        }
    }
}

/// Published blog posts, newest first.
pub fn shape_blog_posts(posts: &[BlogPost]) -> Vec<SiteBlogPost> {
    let mut published: Vec<&BlogPost> = posts.iter().filter(|p| p.published).collect();
    published.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
    published.into_iter().map(SiteBlogPost::from).collect()
}

/// Published episodes, highest episode number first.
pub fn shape_podcast_episodes(episodes: &[PodcastEpisode]) -> Vec<SitePodcastEpisode> {
    let mut published: Vec<&PodcastEpisode> = episodes.iter().filter(|e| e.published).collect();
    published.sort_by(|a, b| b.episode_number.cmp(&a.episode_number));
    published.into_iter().map(SitePodcastEpisode::from).collect()
}

/// Active team members, lowest order first.
pub fn shape_team_members(members: &[TeamMember]) -> Vec<SiteTeamMember> {
    let mut active: Vec<&TeamMember> = members.iter().filter(|m| m.active).collect();
    active.sort_by_key(|m| m.order);
    active.into_iter().map(SiteTeamMember::from).collect()
}

/// Index of every stored media file.
pub fn shape_media_files(files: &[MediaFile]) -> Vec<SiteMediaEntry> {
    files.iter().map(SiteMediaEntry::from).collect()
}

/// Render entries as a pretty-printed JSON array with legacy field copies.
pub fn render_document<T: Serialize>(kind: CollectionKind, entries: &[T]) -> Result<String> {
    let values = entries
        .iter()
        .map(|entry| serde_json::to_value(entry).map(|v| add_legacy_fields(kind, v)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string_pretty(&values)?)
}

/// Builds and publishes the site documents from a content store.
pub struct Publisher<'a, S: KeyValueStore> {
    store: &'a ContentStore<S>,
    content_dir: String,
    media_dir: String,
}

impl<'a, S: KeyValueStore> Publisher<'a, S> {
    /// Publisher over `store`, using the default content and media directories.
    pub fn new(store: &'a ContentStore<S>) -> Self {
        Self {
            store,
            content_dir: DEFAULT_CONTENT_DIR.to_string(),
            media_dir: DEFAULT_MEDIA_DIR.to_string(),
        }
    }

    /// Repository-relative directory the JSON documents are written to.
    pub fn with_content_dir(mut self, dir: impl Into<String>) -> Self {
        self.content_dir = dir.into().trim_end_matches('/').to_string();
        self
    }

    /// Repository-relative directory media bytes are written to.
    pub fn with_media_dir(mut self, dir: impl Into<String>) -> Self {
        self.media_dir = dir.into().trim_end_matches('/').to_string();
        self
    }

    /// Published blog posts, newest first.
    pub fn generate_blog_json(&self) -> Vec<SiteBlogPost> {
        shape_blog_posts(&self.store.blog_posts().list())
    }

    /// Published episodes, highest episode number first.
    pub fn generate_podcast_json(&self) -> Vec<SitePodcastEpisode> {
        shape_podcast_episodes(&self.store.podcast_episodes().list())
    }

    /// Active team members by display order.
    pub fn generate_team_json(&self) -> Vec<SiteTeamMember> {
        shape_team_members(&self.store.team_members().list())
    }

    /// Every stored media file.
    pub fn generate_media_json(&self) -> Vec<SiteMediaEntry> {
        shape_media_files(&self.store.media_files().list())
    }

    /// Repository-relative path of a document.
    pub fn path_for(&self, document: SiteDocument) -> String {
        format!("{}/{}", self.content_dir, document.file_name())
    }

    /// Render one document from the current store contents.
    pub fn render(&self, document: SiteDocument) -> Result<RenderedDocument> {
        let kind = document.kind();
        let contents = match document {
            SiteDocument::Blog => render_document(kind, &self.generate_blog_json())?,
            SiteDocument::Podcast => render_document(kind, &self.generate_podcast_json())?,
            SiteDocument::Team => render_document(kind, &self.generate_team_json())?,
            SiteDocument::Media => render_document(kind, &self.generate_media_json())?,
        };
        Ok(RenderedDocument {
            document,
            path: self.path_for(document),
            contents,
        })
    }

    /// Render every document.
    pub fn render_all(&self) -> Result<Vec<RenderedDocument>> {
        SiteDocument::ALL.iter().map(|d| self.render(*d)).collect()
    }

    /// Publish to `remote` if one is configured, otherwise save through `sink`.
    pub async fn publish(
        &self,
        remote: Option<&dyn RemoteRepository>,
        sink: &dyn DownloadSink,
    ) -> Result<PublishReport> {
        match remote {
            Some(remote) => self.publish_to(remote).await,
            None => self.download(sink),
        }
    }

    /// Validate access, then commit each document conditioned on its current hash.
    ///
    /// A failure on one file does not stop the others.
    pub async fn publish_to(&self, remote: &dyn RemoteRepository) -> Result<PublishReport> {
        let documents = self.render_all()?;
        let target = remote.describe();

        if let Err(e) = remote.validate_access().await {
            warn!("Access validation failed for {}: {}", target, e);
            return Ok(PublishReport::access_denied(&target, &e));
        }

        info!("Publishing {} documents to {}", documents.len(), target);
        let mut files = Vec::with_capacity(documents.len());
        for document in &documents {
            files.push(commit_file(remote, &document.path, document.contents.as_bytes()).await);
        }

        Ok(PublishReport::remote(&target, files))
    }

    /// Save every document through `sink` with a timestamped name.
    pub fn download(&self, sink: &dyn DownloadSink) -> Result<PublishReport> {
        let documents = self.render_all()?;
        let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S");

        let files: Vec<FileOutcome> = documents
            .iter()
            .map(|document| {
                let name = format!("{}-{}.json", document.document.stem(), timestamp);
                match sink.save(&name, &document.contents) {
                    Ok(location) => FileOutcome::succeeded(&document.path, location),
                    Err(e) => FileOutcome::failed(&document.path, e.to_string(), None),
                }
            })
            .collect();

        let status = PublishReport::status_of(&files);
        let saved = files.iter().filter(|f| f.success).count();
        let mut message = format!(
            "No remote repository configured. Saved {} of {} files for manual upload to {}/.",
            saved,
            files.len(),
            self.content_dir
        );
        if status != PublishStatus::Published {
            message.push_str(&format!(" Failed: {}", PublishReport::failure_list(&files)));
        }
        info!("{}", message);

        Ok(PublishReport {
            mode: PublishMode::DownloadFallback,
            status,
            message,
            files,
        })
    }

    /// Publish the media index, then every stored file's bytes.
    pub async fn publish_media(
        &self,
        remote: Option<&dyn RemoteRepository>,
    ) -> Result<PublishReport> {
        let remote = remote.ok_or(CmsError::RemoteNotConfigured)?;
        let target = remote.describe();

        if let Err(e) = remote.validate_access().await {
            warn!("Access validation failed for {}: {}", target, e);
            return Ok(PublishReport::access_denied(&target, &e));
        }

        let index = self.render(SiteDocument::Media)?;
        let index_outcome = commit_file(remote, &index.path, index.contents.as_bytes()).await;
        if !index_outcome.success {
            let message = format!(
                "Failed to publish media index: {}",
                index_outcome.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(PublishReport {
                mode: PublishMode::Remote,
                status: PublishStatus::Failed,
                message,
                files: vec![index_outcome],
            });
        }

        let mut files = vec![index_outcome];
        for file in self.store.media_files().list() {
            let path = format!("{}/{}", self.media_dir, file.filename);
            let outcome = match parse_data_url(&file.data_url) {
                Some((_, bytes)) => commit_file(remote, &path, &bytes).await,
                None => FileOutcome::failed(
                    &path,
                    "Stored media is not a base64 data URL".to_string(),
                    None,
                ),
            };
            files.push(outcome);
        }

        Ok(PublishReport::remote(&target, files))
    }
}

/// Read the current hash of `path`, then write conditioned on it.
async fn commit_file(remote: &dyn RemoteRepository, path: &str, contents: &[u8]) -> FileOutcome {
    let previous = match remote.read_hash(path).await {
        Ok(previous) => previous,
        Err(e) => {
            warn!("Could not read {}: {}", path, e);
            return FileOutcome::remote_failure(path, &e);
        }
    };

    let message = commit_message(path);
    match remote
        .write(path, contents, &message, previous.as_deref())
        .await
    {
        Ok(file) => {
            info!("Committed {}", path);
            FileOutcome::succeeded(path, file.hash)
        }
        Err(e) => {
            warn!("Could not write {}: {}", path, e);
            FileOutcome::remote_failure(path, &e)
        }
    }
}
