//! Content entities managed by the admin.
//!
//! Every collection (blog posts, podcast episodes, team members, media files)
//! shares the same lifecycle: an entity is created from a *draft* (all fields
//! except id and timestamps), changed through a *patch* (only the fields that
//! are set are applied) and deleted by id. The [`Entity`] trait captures that
//! shape together with the hooks the store uses when the key-value area runs
//! out of space.

mod types;

pub use types::{
    BlogPost, BlogPostPatch, MediaFile, MediaFilePatch, NewBlogPost, NewMediaFile,
    NewPodcastEpisode, NewTeamMember, PodcastEpisode, PodcastEpisodePatch, TeamMember,
    TeamMemberPatch,
};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::id::ContentId;

/// Marker appended to text shortened to fit the storage area.
pub const TRUNCATION_MARKER: &str = "...";

/// The four collections held in the key-value area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum CollectionKind {
    /// Blog posts (insights)
    BlogPosts,
    /// Podcast episodes
    PodcastEpisodes,
    /// Team members (about page)
    TeamMembers,
    /// Uploaded media files
    MediaFiles,
}

impl CollectionKind {
    /// All collections, in display order.
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::BlogPosts,
        CollectionKind::PodcastEpisodes,
        CollectionKind::TeamMembers,
        CollectionKind::MediaFiles,
    ];

    /// Key under which the collection's JSON array is stored.
    pub fn storage_key(self) -> &'static str {
        match self {
            CollectionKind::BlogPosts => "surus_cms_blog_posts",
            CollectionKind::PodcastEpisodes => "surus_cms_podcast_episodes",
            CollectionKind::TeamMembers => "surus_cms_team_members",
            CollectionKind::MediaFiles => "surus_cms_files",
        }
    }

    /// Human-readable name of one entity ("Blog post").
    pub fn singular(self) -> &'static str {
        match self {
            CollectionKind::BlogPosts => "Blog post",
            CollectionKind::PodcastEpisodes => "Podcast episode",
            CollectionKind::TeamMembers => "Team member",
            CollectionKind::MediaFiles => "Media file",
        }
    }

    /// Human-readable collection name ("blog posts").
    pub fn plural(self) -> &'static str {
        match self {
            CollectionKind::BlogPosts => "blog posts",
            CollectionKind::PodcastEpisodes => "podcast episodes",
            CollectionKind::TeamMembers => "team members",
            CollectionKind::MediaFiles => "media files",
        }
    }

    /// How many rows survive when a full write is narrowed to recent rows.
    pub fn narrow_limit(self) -> usize {
        match self {
            CollectionKind::MediaFiles => 5,
            _ => 10,
        }
    }
}

/// An entity stored in one of the collections.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Which collection this entity belongs to.
    const KIND: CollectionKind;

    /// Fields supplied by the operator when creating the entity.
    type Draft;

    /// Partial update; unset fields are left alone.
    type Patch;

    /// Build a new entity from a draft, stamping id and timestamps.
    fn from_draft(id: ContentId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge the set fields of `patch` over this entity.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// The entity's identifier.
    fn id(&self) -> &ContentId;

    /// Stamp the last-modified time.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Time used to rank entities by recency when rows must be evicted.
    fn touched_at(&self) -> DateTime<Utc>;

    /// Shorten derivable free text so the row takes less space.
    ///
    /// Returns `true` if anything changed.
    fn trim_for_storage(&mut self) -> bool {
        false
    }

    /// Whether the row should survive when a write is narrowed to important rows.
    fn keep_when_narrowing(&self) -> bool {
        true
    }

    /// Short label for listings and logs.
    fn label(&self) -> String;
}

/// Truncate `text` in place so it is at most `max_chars` characters long,
/// ending with [`TRUNCATION_MARKER`]. Returns `true` if the text was shortened.
pub fn truncate_with_marker(text: &mut String, max_chars: usize) -> bool {
    if text.chars().count() <= max_chars {
        return false;
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    true
}

/// Same as [`truncate_with_marker`] for optional text.
pub fn truncate_optional(text: &mut Option<String>, max_chars: usize) -> bool {
    text.as_mut()
        .is_some_and(|value| truncate_with_marker(value, max_chars))
}

/// Turn a title into a URL-safe slug ("Launch Day!" -> "launch-day").
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Treat blank strings as absent. Other values are kept exactly as entered.
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.trim().is_empty())
}

/// Deserialize a present value (including `null`) as `Some`, so a patch can
/// tell "clear this field" (`null`) apart from "leave it alone" (missing).
pub(crate) fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Accept tags as an array or as a comma-separated string.
pub(crate) fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Joined(String),
    }

    let tags = Option::<Tags>::deserialize(deserializer)?;
    Ok(match tags {
        Some(Tags::List(list)) => list,
        Some(Tags::Joined(joined)) => split_tags(&joined),
        None => Vec::new(),
    })
}

/// Split a comma-separated tag string, dropping blanks.
pub fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_marker_caps_length() {
        let mut text = "a".repeat(250);
        assert!(truncate_with_marker(&mut text, 200));
        assert_eq!(text.chars().count(), 200);
        assert!(text.ends_with(TRUNCATION_MARKER));

        // Already within the ceiling: untouched
        let before = text.clone();
        assert!(!truncate_with_marker(&mut text, 200));
        assert_eq!(text, before);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut text = "é".repeat(20);
        assert!(truncate_with_marker(&mut text, 10));
        assert_eq!(text, format!("{}...", "é".repeat(7)));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Launch Day!"), "launch-day");
        assert_eq!(slugify("  Episode 12: The  Future "), "episode-12-the-future");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("ai, strategy ,,growth"), vec!["ai", "strategy", "growth"]);
    }

    #[test]
    fn test_storage_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            CollectionKind::ALL.iter().map(|k| k.storage_key()).collect();
        assert_eq!(keys.len(), 4);
    }
}
