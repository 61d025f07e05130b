//! Pulling the public site documents back into local drafts.
//!
//! Each item goes through the site schema on its own: a malformed item is
//! skipped and counted, the rest of the batch still lands. Items whose slug
//! (team: name) already exists locally or earlier in the batch are skipped as
//! duplicates. Each collection is written once, after all its items parsed.

use std::collections::HashSet;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use ts_rs::TS;

use super::aliases::resolve_legacy_fields;
use super::types::{SiteBlogPost, SitePodcastEpisode, SiteTeamMember};
use crate::content::{
    BlogPost, CollectionKind, Entity, NewBlogPost, NewPodcastEpisode, NewTeamMember,
    PodcastEpisode, TeamMember, slugify,
};
use crate::error::{CmsError, Result};
use crate::id::ContentId;
use crate::storage::KeyValueStore;
use crate::store::{Collection, ContentStore};

/// Raw site documents to import. Absent documents are left alone.
#[derive(Debug, Clone, Default)]
pub struct SiteImport {
    /// Contents of `blog.json`
    pub blog: Option<Value>,
    /// Contents of `podcast.json`
    pub podcast: Option<Value>,
    /// Contents of `team.json`
    pub team: Option<Value>,
}

#[cfg(not(target_arch = "wasm32"))]
impl SiteImport {
    /// Read `blog.json`, `podcast.json` and `team.json` from a directory,
    /// typically a checkout's `public/data`. Missing files are skipped.
    pub fn from_dir(dir: &std::path::Path) -> Result<Self> {
        let read = |name: &str| -> Result<Option<Value>> {
            let path = dir.join(name);
            if !path.exists() {
                return Ok(None);
            }
            let raw = std::fs::read_to_string(&path)
                .map_err(|source| CmsError::FileRead { path, source })?;
            Ok(Some(serde_json::from_str(&raw)?))
        };

        Ok(Self {
            blog: read("blog.json")?,
            podcast: read("podcast.json")?,
            team: read("team.json")?,
        })
    }
}

/// Counts of what an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ImportSummary {
    /// Blog posts imported
    pub blog_posts: usize,
    /// Podcast episodes imported
    pub podcast_episodes: usize,
    /// Team members imported
    pub team_members: usize,
    /// Malformed items
    pub skipped: usize,
    /// Items already present locally or repeated in the batch
    pub duplicates: usize,
}

impl ImportSummary {
    /// Items added across all collections.
    pub fn imported(&self) -> usize {
        self.blog_posts + self.podcast_episodes + self.team_members
    }
}

/// Parse each array item through the site schema, counting failures.
fn parse_items<T: DeserializeOwned>(
    kind: CollectionKind,
    document: Value,
    skipped: &mut usize,
) -> Result<Vec<T>> {
    let Value::Array(items) = document else {
        return Err(CmsError::validation(format!(
            "{} document must be a JSON array",
            kind.plural()
        )));
    };

    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(resolve_legacy_fields(kind, item)) {
            Ok(entry) => parsed.push(entry),
            Err(e) => {
                warn!("Skipping malformed {} #{}: {}", kind.singular(), index, e);
                *skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Append drafts whose key is not already taken, then write the collection once.
fn merge_into<S, T, D>(
    collection: &Collection<'_, S, T>,
    drafts: Vec<D>,
    key_of_row: impl Fn(&T) -> String,
    key_of_draft: impl Fn(&D) -> String,
    duplicates: &mut usize,
) -> Result<usize>
where
    S: KeyValueStore,
    T: Entity<Draft = D>,
{
    let mut rows = collection.list();
    let mut seen: HashSet<String> = rows.iter().map(&key_of_row).collect();
    let now = Utc::now();

    let mut added = 0;
    for draft in drafts {
        if !seen.insert(key_of_draft(&draft)) {
            *duplicates += 1;
            continue;
        }
        rows.push(T::from_draft(ContentId::generate(), draft, now));
        added += 1;
    }

    if added > 0 {
        collection.replace_all(&rows)?;
    }
    Ok(added)
}

fn slug_key(slug: &str, title: &str) -> String {
    if slug.trim().is_empty() {
        slugify(title)
    } else {
        slug.to_string()
    }
}

/// Import site documents into the local store.
pub fn import_site<S: KeyValueStore>(
    store: &ContentStore<S>,
    import: SiteImport,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    if let Some(document) = import.blog {
        let drafts: Vec<NewBlogPost> =
            parse_items::<SiteBlogPost>(CollectionKind::BlogPosts, document, &mut summary.skipped)?
                .into_iter()
                .map(NewBlogPost::from)
                .collect();
        summary.blog_posts = merge_into(
            &store.blog_posts(),
            drafts,
            |post: &BlogPost| post.slug.clone(),
            |draft| slug_key(&draft.slug, &draft.title),
            &mut summary.duplicates,
        )?;
    }

    if let Some(document) = import.podcast {
        let drafts: Vec<NewPodcastEpisode> = parse_items::<SitePodcastEpisode>(
            CollectionKind::PodcastEpisodes,
            document,
            &mut summary.skipped,
        )?
        .into_iter()
        .map(NewPodcastEpisode::from)
        .collect();
        summary.podcast_episodes = merge_into(
            &store.podcast_episodes(),
            drafts,
            |episode: &PodcastEpisode| episode.slug.clone(),
            |draft| slug_key(&draft.slug, &draft.title),
            &mut summary.duplicates,
        )?;
    }

    if let Some(document) = import.team {
        let drafts: Vec<NewTeamMember> = parse_items::<SiteTeamMember>(
            CollectionKind::TeamMembers,
            document,
            &mut summary.skipped,
        )?
        .into_iter()
        .map(NewTeamMember::from)
        .collect();
        summary.team_members = merge_into(
            &store.team_members(),
            drafts,
            |member: &TeamMember| member.name.clone(),
            |draft| draft.name.clone(),
            &mut summary.duplicates,
        )?;
    }

    info!(
        "Imported {} blog posts, {} podcast episodes, {} team members ({} skipped, {} duplicates)",
        summary.blog_posts,
        summary.podcast_episodes,
        summary.team_members,
        summary.skipped,
        summary.duplicates
    );
    Ok(summary)
}
