use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{
    CollectionKind, Entity, deserialize_some, deserialize_tags, slugify, truncate_optional,
    truncate_with_marker,
};
use crate::id::ContentId;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_true() -> bool {
    true
}

/// Use the explicit slug, or derive one from the title when left blank.
fn slug_or_title(slug: String, title: &str) -> String {
    if slug.trim().is_empty() {
        slugify(title)
    } else {
        slug
    }
}

// ============================================================================
// Blog posts
// ============================================================================

/// A blog post (insight) as stored in the local area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BlogPost {
    /// Stable identifier
    pub id: ContentId,
    /// Headline
    pub title: String,
    /// URL-safe slug; expected but not enforced to be unique
    pub slug: String,
    /// Byline
    #[serde(default)]
    pub author: String,
    /// Short teaser shown in listings
    #[serde(default)]
    pub summary: String,
    /// Markdown body
    #[serde(default)]
    pub content: String,
    /// Cover image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-form tags
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Highlighted on the home page
    #[serde(default)]
    pub featured: bool,
    /// Visible on the public site
    #[serde(default)]
    pub published: bool,
    /// Calendar date shown on the site
    pub publish_date: NaiveDate,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBlogPost {
    /// Headline
    pub title: String,
    /// URL slug, derived from the title when empty
    pub slug: String,
    /// Byline
    pub author: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full body text
    pub content: String,
    /// Cover image URL or data URL
    pub image: Option<String>,
    /// Free-form tags
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Highlighted on the home page
    pub featured: bool,
    /// Visible on the public site
    pub published: bool,
    /// Calendar date shown on the site
    pub publish_date: NaiveDate,
}

impl Default for NewBlogPost {
    fn default() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            author: String::new(),
            summary: String::new(),
            content: String::new(),
            image: None,
            tags: Vec::new(),
            featured: false,
            published: false,
            publish_date: today(),
        }
    }
}

/// Partial update of a blog post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    /// Headline
    pub title: Option<String>,
    /// URL slug, derived from the title when empty
    pub slug: Option<String>,
    /// Byline
    pub author: Option<String>,
    /// Short teaser shown in listings
    pub summary: Option<String>,
    /// Full body text
    pub content: Option<String>,
    /// Cover image URL or data URL; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image: Option<Option<String>>,
    /// Free-form tags
    pub tags: Option<Vec<String>>,
    /// Highlighted on the home page
    pub featured: Option<bool>,
    /// Visible on the public site
    pub published: Option<bool>,
    /// Calendar date shown on the site
    pub publish_date: Option<NaiveDate>,
}

impl Entity for BlogPost {
    const KIND: CollectionKind = CollectionKind::BlogPosts;
    type Draft = NewBlogPost;
    type Patch = BlogPostPatch;

    fn from_draft(id: ContentId, draft: NewBlogPost, now: DateTime<Utc>) -> Self {
        Self {
            id,
            slug: slug_or_title(draft.slug, &draft.title),
            title: draft.title,
            author: draft.author,
            summary: draft.summary,
            content: draft.content,
            image: draft.image,
            tags: draft.tags,
            featured: draft.featured,
            published: draft.published,
            publish_date: draft.publish_date,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: BlogPostPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(date) = patch.publish_date {
            self.publish_date = date;
        }
    }

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn touched_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn trim_for_storage(&mut self) -> bool {
        truncate_with_marker(&mut self.summary, BlogPost::SUMMARY_CEILING)
    }

    fn label(&self) -> String {
        let state = if self.published { "published" } else { "draft" };
        format!("{} [{}] ({})", self.title, self.publish_date, state)
    }
}

impl BlogPost {
    /// Summary length kept when the store trims rows to save space.
    pub const SUMMARY_CEILING: usize = 300;
}

// ============================================================================
// Podcast episodes
// ============================================================================

/// A podcast episode as stored in the local area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PodcastEpisode {
    /// Stable identifier
    pub id: ContentId,
    /// Episode number, newest is highest
    pub episode_number: u32,
    /// Episode title
    pub title: String,
    /// URL slug, derived from the title when empty
    pub slug: String,
    /// Markdown show notes
    #[serde(default)]
    pub description: String,
    /// Guest name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
    /// Guest's role or affiliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_title: Option<String>,
    /// Free-text duration ("42 min")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Cover image URL or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Direct audio link (Libsyn)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Spotify listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
    /// Apple Podcasts listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_url: Option<String>,
    /// Amazon Music listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    /// Generic "listen" link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    /// Full transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Free-form tags
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Highlighted on the home page
    #[serde(default)]
    pub featured: bool,
    /// Visible on the public site
    #[serde(default)]
    pub published: bool,
    /// Calendar date shown on the site
    pub publish_date: NaiveDate,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new podcast episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPodcastEpisode {
    /// Episode number, newest is highest
    pub episode_number: u32,
    /// Episode title
    pub title: String,
    /// URL slug, derived from the title when empty
    pub slug: String,
    /// Episode notes
    pub description: String,
    /// Guest name
    pub guest: Option<String>,
    /// Guest's role or affiliation
    pub guest_title: Option<String>,
    /// Running time as displayed, e.g. "42:10"
    pub duration: Option<String>,
    /// Cover image URL or data URL
    pub image: Option<String>,
    /// Hosted audio file
    pub audio_url: Option<String>,
    /// Spotify listing
    pub spotify_url: Option<String>,
    /// Apple Podcasts listing
    pub apple_url: Option<String>,
    /// Amazon Music listing
    pub amazon_url: Option<String>,
    /// YouTube video
    pub youtube_url: Option<String>,
    /// Full transcript
    pub transcript: Option<String>,
    /// Free-form tags
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Highlighted on the home page
    pub featured: bool,
    /// Visible on the public site
    pub published: bool,
    /// Calendar date shown on the site
    pub publish_date: NaiveDate,
}

impl Default for NewPodcastEpisode {
    fn default() -> Self {
        Self {
            episode_number: 1,
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            guest: None,
            guest_title: None,
            duration: None,
            image: None,
            audio_url: None,
            spotify_url: None,
            apple_url: None,
            amazon_url: None,
            youtube_url: None,
            transcript: None,
            tags: Vec::new(),
            featured: false,
            published: false,
            publish_date: today(),
        }
    }
}

/// Partial update of a podcast episode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastEpisodePatch {
    /// Episode number, newest is highest
    pub episode_number: Option<u32>,
    /// Episode title
    pub title: Option<String>,
    /// URL slug, derived from the title when empty
    pub slug: Option<String>,
    /// Episode notes
    pub description: Option<String>,
    /// Guest name; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guest: Option<Option<String>>,
    /// Guest's role or affiliation; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guest_title: Option<Option<String>>,
    /// Running time as displayed, e.g. "42:10"; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub duration: Option<Option<String>>,
    /// Cover image URL or data URL; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image: Option<Option<String>>,
    /// Hosted audio file; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub audio_url: Option<Option<String>>,
    /// Spotify listing; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub spotify_url: Option<Option<String>>,
    /// Apple Podcasts listing; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub apple_url: Option<Option<String>>,
    /// Amazon Music listing; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub amazon_url: Option<Option<String>>,
    /// YouTube video; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub youtube_url: Option<Option<String>>,
    /// Full transcript; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub transcript: Option<Option<String>>,
    /// Free-form tags
    pub tags: Option<Vec<String>>,
    /// Highlighted on the home page
    pub featured: Option<bool>,
    /// Visible on the public site
    pub published: Option<bool>,
    /// Calendar date shown on the site
    pub publish_date: Option<NaiveDate>,
}

impl Entity for PodcastEpisode {
    const KIND: CollectionKind = CollectionKind::PodcastEpisodes;
    type Draft = NewPodcastEpisode;
    type Patch = PodcastEpisodePatch;

    fn from_draft(id: ContentId, draft: NewPodcastEpisode, now: DateTime<Utc>) -> Self {
        Self {
            id,
            episode_number: draft.episode_number,
            slug: slug_or_title(draft.slug, &draft.title),
            title: draft.title,
            description: draft.description,
            guest: draft.guest,
            guest_title: draft.guest_title,
            duration: draft.duration,
            image: draft.image,
            audio_url: draft.audio_url,
            spotify_url: draft.spotify_url,
            apple_url: draft.apple_url,
            amazon_url: draft.amazon_url,
            youtube_url: draft.youtube_url,
            transcript: draft.transcript,
            tags: draft.tags,
            featured: draft.featured,
            published: draft.published,
            publish_date: draft.publish_date,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PodcastEpisodePatch) {
        if let Some(number) = patch.episode_number {
            self.episode_number = number;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        let optional_fields = [
            (&mut self.guest, patch.guest),
            (&mut self.guest_title, patch.guest_title),
            (&mut self.duration, patch.duration),
            (&mut self.image, patch.image),
            (&mut self.audio_url, patch.audio_url),
            (&mut self.spotify_url, patch.spotify_url),
            (&mut self.apple_url, patch.apple_url),
            (&mut self.amazon_url, patch.amazon_url),
            (&mut self.youtube_url, patch.youtube_url),
            (&mut self.transcript, patch.transcript),
        ];
        for (field, update) in optional_fields {
            if let Some(value) = update {
                *field = value;
            }
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(date) = patch.publish_date {
            self.publish_date = date;
        }
    }

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn touched_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn trim_for_storage(&mut self) -> bool {
        let description =
            truncate_with_marker(&mut self.description, PodcastEpisode::DESCRIPTION_CEILING);
        let transcript =
            truncate_optional(&mut self.transcript, PodcastEpisode::TRANSCRIPT_CEILING);
        description || transcript
    }

    fn label(&self) -> String {
        let state = if self.published { "published" } else { "draft" };
        format!("#{} {} ({})", self.episode_number, self.title, state)
    }
}

impl PodcastEpisode {
    /// Description length kept when the store trims rows to save space.
    pub const DESCRIPTION_CEILING: usize = 200;
    /// Transcript length kept when the store trims rows to save space.
    pub const TRANSCRIPT_CEILING: usize = 500;
}

// ============================================================================
// Team members
// ============================================================================

/// A team member shown on the about page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TeamMember {
    /// Stable identifier
    pub id: ContentId,
    /// Full name
    pub name: String,
    /// Job title
    #[serde(default)]
    pub title: String,
    /// Markdown bio
    #[serde(default)]
    pub bio: String,
    /// Lower sorts first
    #[serde(default)]
    pub order: i32,
    /// Headshot reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// LinkedIn profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    /// Twitter/X profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    /// Inactive members stay in the store but are hidden from the site
    #[serde(default = "default_true")]
    pub active: bool,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new team member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTeamMember {
    /// Full name
    pub name: String,
    /// Job title
    pub title: String,
    /// Short biography
    pub bio: String,
    /// Position on the team page, ascending
    pub order: i32,
    /// Cover image URL or data URL
    pub image: Option<String>,
    /// LinkedIn profile
    pub linkedin_url: Option<String>,
    /// Twitter/X profile
    pub twitter_url: Option<String>,
    /// Shown on the team page
    pub active: bool,
}

impl Default for NewTeamMember {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            bio: String::new(),
            order: 0,
            image: None,
            linkedin_url: None,
            twitter_url: None,
            active: true,
        }
    }
}

/// Partial update of a team member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    /// Full name
    pub name: Option<String>,
    /// Job title
    pub title: Option<String>,
    /// Short biography
    pub bio: Option<String>,
    /// Position on the team page, ascending
    pub order: Option<i32>,
    /// Cover image URL or data URL; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image: Option<Option<String>>,
    /// LinkedIn profile; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub linkedin_url: Option<Option<String>>,
    /// Twitter/X profile; `Some(None)` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub twitter_url: Option<Option<String>>,
    /// Shown on the team page
    pub active: Option<bool>,
}

impl Entity for TeamMember {
    const KIND: CollectionKind = CollectionKind::TeamMembers;
    type Draft = NewTeamMember;
    type Patch = TeamMemberPatch;

    fn from_draft(id: ContentId, draft: NewTeamMember, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            title: draft.title,
            bio: draft.bio,
            order: draft.order,
            image: draft.image,
            linkedin_url: draft.linkedin_url,
            twitter_url: draft.twitter_url,
            active: draft.active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TeamMemberPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(bio) = patch.bio {
            self.bio = bio;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(linkedin) = patch.linkedin_url {
            self.linkedin_url = linkedin;
        }
        if let Some(twitter) = patch.twitter_url {
            self.twitter_url = twitter;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn touched_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn trim_for_storage(&mut self) -> bool {
        truncate_with_marker(&mut self.bio, TeamMember::BIO_CEILING)
    }

    fn keep_when_narrowing(&self) -> bool {
        self.active
    }

    fn label(&self) -> String {
        let state = if self.active { "active" } else { "inactive" };
        format!("{} - {} (order {}, {})", self.name, self.title, self.order, state)
    }
}

impl TeamMember {
    /// Bio length kept when the store trims rows to save space.
    pub const BIO_CEILING: usize = 500;
}

// ============================================================================
// Media files
// ============================================================================

/// An uploaded file stored inline as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MediaFile {
    /// Stable identifier
    pub id: ContentId,
    /// Generated name: id plus the original extension
    pub filename: String,
    /// Name of the file as uploaded
    pub original_name: String,
    /// `data:<mime>;base64,<payload>`
    #[serde(rename = "url")]
    pub data_url: String,
    /// MIME type of the stored bytes
    pub mime_type: String,
    /// Size of the stored (possibly compressed) bytes
    pub size: u64,
    /// When the file was uploaded
    pub uploaded_at: DateTime<Utc>,
    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for a new media file, produced by media ingestion.
#[derive(Debug, Clone)]
pub struct NewMediaFile {
    /// Name of the file as uploaded
    pub original_name: String,
    /// Base64 data URL of the bytes
    pub data_url: String,
    /// MIME type of the stored bytes
    pub mime_type: String,
    /// Size of the stored bytes
    pub size: u64,
}

/// Partial update of a media file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFilePatch {
    /// Rename the file
    pub original_name: Option<String>,
}

impl MediaFile {
    /// Build the generated filename: the id plus the original extension.
    ///
    /// Images re-encoded as JPEG get a `jpg` extension whatever they were uploaded as.
    pub fn generated_filename(id: &ContentId, original_name: &str, mime_type: &str) -> String {
        let ext = match original_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
            _ => None,
        };
        match ext {
            Some(ext) if mime_type == "image/jpeg" && ext != "jpg" && ext != "jpeg" => {
                format!("{}.jpg", id)
            }
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        }
    }
}

impl Entity for MediaFile {
    const KIND: CollectionKind = CollectionKind::MediaFiles;
    type Draft = NewMediaFile;
    type Patch = MediaFilePatch;

    fn from_draft(id: ContentId, draft: NewMediaFile, now: DateTime<Utc>) -> Self {
        Self {
            filename: MediaFile::generated_filename(&id, &draft.original_name, &draft.mime_type),
            id,
            original_name: draft.original_name,
            data_url: draft.data_url,
            mime_type: draft.mime_type,
            size: draft.size,
            uploaded_at: now,
            updated_at: None,
        }
    }

    fn apply_patch(&mut self, patch: MediaFilePatch) {
        if let Some(name) = patch.original_name {
            self.original_name = name;
        }
    }

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    fn touched_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    fn label(&self) -> String {
        format!(
            "{} -> {} ({}, {} bytes)",
            self.original_name, self.filename, self.mime_type, self.size
        )
    }
}
