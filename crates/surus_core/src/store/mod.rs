//! Local content store.
//!
//! [`ContentStore`] owns the four collections kept in a [`KeyValueStore`].
//! Each collection lives under its own key as a JSON array, so a corrupt or
//! missing value for one collection never affects the others.
//!
//! ```ignore
//! use surus_core::storage::MemoryKeyValueStore;
//! use surus_core::store::ContentStore;
//!
//! let store = ContentStore::new(MemoryKeyValueStore::new());
//! let post = store.blog_posts().create(Default::default())?;
//! store.blog_posts().delete(&post.id)?;
//! ```

mod collection;
mod snapshot;

pub use collection::Collection;
pub use snapshot::Snapshot;

use serde::Serialize;
use ts_rs::TS;

use crate::content::{BlogPost, CollectionKind, MediaFile, PodcastEpisode, TeamMember};
use crate::error::Result;
use crate::storage::{KeyValueStore, StorageUsage};

/// Entity counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ContentSummary {
    /// Stored blog posts
    pub blog_posts: usize,
    /// Stored podcast episodes
    pub podcast_episodes: usize,
    /// Stored team members
    pub team_members: usize,
    /// Stored media files
    pub media_files: usize,
}

impl ContentSummary {
    /// Count for one collection.
    pub fn get(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::BlogPosts => self.blog_posts,
            CollectionKind::PodcastEpisodes => self.podcast_episodes,
            CollectionKind::TeamMembers => self.team_members,
            CollectionKind::MediaFiles => self.media_files,
        }
    }
}

/// How much of the local content would appear on the site if published now.
///
/// Active team members and every media file count as published; drafts and
/// inactive members count as drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PublishStats {
    /// Would appear on the site
    pub published: usize,
    /// Drafts and inactive members
    pub draft: usize,
    /// Everything stored
    pub total: usize,
}

/// The local content store over a key-value backend.
pub struct ContentStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> ContentStore<S> {
    /// Create a store over `kv`.
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// The underlying key-value backend.
    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Blog posts.
    pub fn blog_posts(&self) -> Collection<'_, S, BlogPost> {
        Collection::new(&self.kv)
    }

    /// Podcast episodes.
    pub fn podcast_episodes(&self) -> Collection<'_, S, PodcastEpisode> {
        Collection::new(&self.kv)
    }

    /// Team members.
    pub fn team_members(&self) -> Collection<'_, S, TeamMember> {
        Collection::new(&self.kv)
    }

    /// Uploaded media files.
    pub fn media_files(&self) -> Collection<'_, S, MediaFile> {
        Collection::new(&self.kv)
    }

    /// Usage of the whole key-value area, including keys the store does not own.
    pub fn usage(&self) -> Result<StorageUsage> {
        Ok(self.kv.usage()?)
    }

    /// Entity counts per collection.
    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            blog_posts: self.blog_posts().count(),
            podcast_episodes: self.podcast_episodes().count(),
            team_members: self.team_members().count(),
            media_files: self.media_files().count(),
        }
    }

    /// Published vs. draft counts across all collections.
    pub fn publish_stats(&self) -> PublishStats {
        let blogs = self.blog_posts().list();
        let episodes = self.podcast_episodes().list();
        let team = self.team_members().list();
        let media = self.media_files().count();

        let published = blogs.iter().filter(|b| b.published).count()
            + episodes.iter().filter(|e| e.published).count()
            + team.iter().filter(|m| m.active).count()
            + media;
        let total = blogs.len() + episodes.len() + team.len() + media;

        PublishStats {
            published,
            draft: total - published,
            total,
        }
    }

    /// Remove every collection key. Keys the store does not own are left alone.
    pub fn clear_all(&self) -> Result<()> {
        for kind in CollectionKind::ALL {
            self.kv.remove(kind.storage_key())?;
        }
        log::info!("Cleared all local content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{NewBlogPost, NewTeamMember};
    use crate::storage::MemoryKeyValueStore;

    #[test]
    fn test_publish_stats_counts_active_and_media_as_published() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        store
            .blog_posts()
            .create(NewBlogPost {
                published: true,
                ..Default::default()
            })
            .unwrap();
        store.blog_posts().create(NewBlogPost::default()).unwrap();
        store
            .team_members()
            .create(NewTeamMember {
                name: "Ada".to_string(),
                active: false,
                ..Default::default()
            })
            .unwrap();

        let stats = store.publish_stats();
        assert_eq!(stats, PublishStats { published: 1, draft: 2, total: 3 });
    }

    #[test]
    fn test_clear_all_leaves_foreign_keys() {
        let kv = MemoryKeyValueStore::new().with_raw("theme", "dark");
        let store = ContentStore::new(kv);
        store.blog_posts().create(NewBlogPost::default()).unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.summary(), ContentSummary::default());
        assert_eq!(store.backend().get("theme").unwrap().as_deref(), Some("dark"));
    }
}
