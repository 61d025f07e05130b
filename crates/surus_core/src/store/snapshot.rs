//! Export and import of the whole local store as one document.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ContentStore, ContentSummary};
use crate::content::{BlogPost, CollectionKind, MediaFile, PodcastEpisode, TeamMember};
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Every collection in one serializable document.
///
/// On import, only the collections present in the document are replaced;
/// a missing collection leaves the stored one untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Blog posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_posts: Option<Vec<BlogPost>>,
    /// Podcast episodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podcast_episodes: Option<Vec<PodcastEpisode>>,
    /// Team members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_members: Option<Vec<TeamMember>>,
    /// Media files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_files: Option<Vec<MediaFile>>,
    /// When the snapshot was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Parse a snapshot document. The whole document is rejected if any part is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON for download.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<S: KeyValueStore> ContentStore<S> {
    /// Capture every collection.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            blog_posts: Some(self.blog_posts().list()),
            podcast_episodes: Some(self.podcast_episodes().list()),
            team_members: Some(self.team_members().list()),
            media_files: Some(self.media_files().list()),
            exported_at: Some(Utc::now()),
        }
    }

    /// Replace the collections present in `snapshot` wholesale.
    ///
    /// All or nothing: if any collection does not fit, the collections
    /// already replaced are put back and the error is returned.
    /// Returns how many entities were restored per collection.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ContentSummary> {
        let prior = CollectionKind::ALL
            .iter()
            .map(|kind| Ok((kind.storage_key(), self.kv.get(kind.storage_key())?)))
            .collect::<Result<Vec<_>>>()?;

        let restored = match self.write_snapshot(snapshot) {
            Ok(restored) => restored,
            Err(e) => {
                warn!("Snapshot import failed, restoring previous content: {}", e);
                self.restore_raw(&prior);
                return Err(e);
            }
        };

        info!(
            "Imported snapshot: {} blog posts, {} podcast episodes, {} team members, {} media files",
            restored.blog_posts,
            restored.podcast_episodes,
            restored.team_members,
            restored.media_files
        );
        Ok(restored)
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<ContentSummary> {
        let mut restored = ContentSummary::default();

        if let Some(rows) = &snapshot.blog_posts {
            self.blog_posts().replace_all(rows)?;
            restored.blog_posts = rows.len();
        }
        if let Some(rows) = &snapshot.podcast_episodes {
            self.podcast_episodes().replace_all(rows)?;
            restored.podcast_episodes = rows.len();
        }
        if let Some(rows) = &snapshot.team_members {
            self.team_members().replace_all(rows)?;
            restored.team_members = rows.len();
        }
        if let Some(rows) = &snapshot.media_files {
            self.media_files().replace_all(rows)?;
            restored.media_files = rows.len();
        }
        Ok(restored)
    }

    /// Put raw collection values back. Keys are removed first so the old
    /// values never compete with the partially imported ones for space.
    fn restore_raw(&self, prior: &[(&'static str, Option<String>)]) {
        for (key, _) in prior {
            if let Err(e) = self.kv.remove(key) {
                error!("Could not clear {} while restoring: {}", key, e);
            }
        }
        for (key, value) in prior {
            if let Some(value) = value
                && let Err(e) = self.kv.set(key, value)
            {
                error!("Could not restore {}: {}", key, e);
            }
        }
    }
}
