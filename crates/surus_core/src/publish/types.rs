//! Shapes of the JSON documents the public site reads.
//!
//! These are explicit schemas: the reconciler renders local entities into
//! them, and site import parses external JSON through them, skipping items
//! that do not fit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{
    BlogPost, MediaFile, NewBlogPost, NewPodcastEpisode, NewTeamMember, PodcastEpisode,
    TeamMember, deserialize_tags, non_empty,
};
use crate::id::ContentId;

/// Site-relative directory uploaded media is served from.
pub const MEDIA_PUBLIC_DIR: &str = "images/uploads";

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_true() -> bool {
    true
}

/// Dates are published as midnight UTC ("2025-01-01T00:00:00.000Z") and
/// accepted back either in that form or as a bare calendar date.
mod site_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("invalid date {:?}: {}", raw, e)))
    }
}

/// Timestamps are published with millisecond precision ("2025-01-01T09:30:00.123Z").
fn serialize_site_timestamp<S: serde::Serializer>(
    at: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Entry of `blog.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBlogPost {
    /// Headline
    pub title: String,
    /// URL slug, derived from the title when empty
    #[serde(default)]
    pub slug: String,
    /// Byline
    #[serde(default)]
    pub author: String,
    /// Publication date
    #[serde(with = "site_date", default = "today", alias = "publishDate")]
    pub date: NaiveDate,
    /// Short teaser shown in listings
    #[serde(default)]
    pub summary: String,
    /// Full body text
    #[serde(default)]
    pub content: String,
    /// Cover image URL or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-form tags
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Highlighted on the home page
    #[serde(default)]
    pub featured: bool,
    /// Visible on the public site
    #[serde(default = "default_true")]
    pub published: bool,
}

impl From<&BlogPost> for SiteBlogPost {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            author: post.author.clone(),
            date: post.publish_date,
            summary: post.summary.clone(),
            content: post.content.clone(),
            image: non_empty(&post.image),
            tags: post.tags.clone(),
            featured: post.featured,
            published: post.published,
        }
    }
}

impl From<SiteBlogPost> for NewBlogPost {
    fn from(site: SiteBlogPost) -> Self {
        Self {
            title: site.title,
            slug: site.slug,
            author: site.author,
            summary: site.summary,
            content: site.content,
            image: non_empty(&site.image),
            tags: site.tags,
            featured: site.featured,
            published: site.published,
            publish_date: site.date,
        }
    }
}

/// Entry of `podcast.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePodcastEpisode {
    /// Episode number, newest is highest
    pub episode_number: u32,
    /// Episode title
    pub title: String,
    /// URL slug, derived from the title when empty
    #[serde(default)]
    pub slug: String,
    /// Publication date
    #[serde(with = "site_date", default = "today", alias = "publishDate")]
    pub date: NaiveDate,
    /// Episode notes
    #[serde(default)]
    pub description: String,
    /// Guest name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
    /// Guest's role or affiliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_title: Option<String>,
    /// Running time as displayed, e.g. "42:10"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Cover image URL or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Hosted audio file
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
    /// YouTube video
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
    #[serde(default = "default_true")]
    pub published: bool,
}

impl From<&PodcastEpisode> for SitePodcastEpisode {
    fn from(episode: &PodcastEpisode) -> Self {
        Self {
            episode_number: episode.episode_number,
            title: episode.title.clone(),
            slug: episode.slug.clone(),
            date: episode.publish_date,
            description: episode.description.clone(),
            guest: non_empty(&episode.guest),
            guest_title: non_empty(&episode.guest_title),
            duration: non_empty(&episode.duration),
            image: non_empty(&episode.image),
            audio_url: non_empty(&episode.audio_url),
            spotify_url: non_empty(&episode.spotify_url),
            apple_url: non_empty(&episode.apple_url),
            amazon_url: non_empty(&episode.amazon_url),
            youtube_url: non_empty(&episode.youtube_url),
            transcript: non_empty(&episode.transcript),
            tags: episode.tags.clone(),
            featured: episode.featured,
            published: episode.published,
        }
    }
}

impl From<SitePodcastEpisode> for NewPodcastEpisode {
    fn from(site: SitePodcastEpisode) -> Self {
        Self {
            episode_number: site.episode_number,
            title: site.title,
            slug: site.slug,
            description: site.description,
            guest: non_empty(&site.guest),
            guest_title: non_empty(&site.guest_title),
            duration: non_empty(&site.duration),
            image: non_empty(&site.image),
            audio_url: non_empty(&site.audio_url),
            spotify_url: non_empty(&site.spotify_url),
            apple_url: non_empty(&site.apple_url),
            amazon_url: non_empty(&site.amazon_url),
            youtube_url: non_empty(&site.youtube_url),
            transcript: non_empty(&site.transcript),
            tags: site.tags,
            featured: site.featured,
            published: site.published,
            publish_date: site.date,
        }
    }
}

/// Entry of `team.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteTeamMember {
    /// Full name
    pub name: String,
    /// Job title
    #[serde(default)]
    pub title: String,
    /// Short biography
    #[serde(default)]
    pub bio: String,
    /// Position on the team page, ascending
    #[serde(default)]
    pub order: i32,
    /// Cover image URL or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// LinkedIn profile
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "linkedin_url")]
    pub linkedin_url: Option<String>,
    /// Twitter/X profile
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "twitter_url")]
    pub twitter_url: Option<String>,
    /// Shown on the team page
    #[serde(default = "default_true")]
    pub active: bool,
}

impl From<&TeamMember> for SiteTeamMember {
    fn from(member: &TeamMember) -> Self {
        Self {
            name: member.name.clone(),
            title: member.title.clone(),
            bio: member.bio.clone(),
            order: member.order,
            image: non_empty(&member.image),
            linkedin_url: non_empty(&member.linkedin_url),
            twitter_url: non_empty(&member.twitter_url),
            active: member.active,
        }
    }
}

impl From<SiteTeamMember> for NewTeamMember {
    fn from(site: SiteTeamMember) -> Self {
        Self {
            name: site.name,
            title: site.title,
            bio: site.bio,
            order: site.order,
            image: non_empty(&site.image),
            linkedin_url: non_empty(&site.linkedin_url),
            twitter_url: non_empty(&site.twitter_url),
            active: site.active,
        }
    }
}

/// Entry of `media.json`. The bytes themselves are published separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMediaEntry {
    /// Stable identifier
    pub id: ContentId,
    /// Generated, collision-free file name
    pub filename: String,
    /// Name of the file as uploaded
    pub original_name: String,
    /// MIME type of the stored bytes
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// When the file was uploaded
    #[serde(serialize_with = "serialize_site_timestamp")]
    pub uploaded_at: DateTime<Utc>,
    /// Site-relative path ("images/uploads/<filename>")
    pub path: String,
}

impl From<&MediaFile> for SiteMediaEntry {
    fn from(file: &MediaFile) -> Self {
        Self {
            id: file.id.clone(),
            filename: file.filename.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            uploaded_at: file.uploaded_at,
            path: format!("{}/{}", MEDIA_PUBLIC_DIR, file.filename),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    #[test]
    fn test_date_written_as_midnight_utc() {
        let site = SiteBlogPost {
            title: "Launch Day".to_string(),
            slug: "launch-day".to_string(),
            author: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            summary: String::new(),
            content: String::new(),
            image: None,
            tags: Vec::new(),
            featured: false,
            published: true,
        };
        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["date"], "2025-01-01T00:00:00.000Z");
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_date_accepts_plain_calendar_date() {
        let site: SiteBlogPost =
            serde_json::from_str(r#"{"title": "T", "date": "2024-03-05"}"#).unwrap();
        assert_eq!(site.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert!(site.published);
    }

    #[test]
    fn test_rejects_garbage_date() {
        assert!(serde_json::from_str::<SiteBlogPost>(r#"{"title": "T", "date": "soon"}"#).is_err());
    }

    #[test]
    fn test_empty_optional_strings_are_dropped() {
        let member = SiteTeamMember::from(&TeamMember {
            id: ContentId::from("t"),
            name: "Ada".to_string(),
            title: "CTO".to_string(),
            bio: String::new(),
            order: 1,
            image: Some("   ".to_string()),
            linkedin_url: Some(String::new()),
            twitter_url: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        let json = serde_json::to_value(&member).unwrap();
        assert!(json.get("image").is_none());
        assert!(json.get("linkedinUrl").is_none());
    }

    #[test]
    fn test_optional_strings_published_as_entered() {
        let member = SiteTeamMember::from(&TeamMember {
            id: ContentId::from("t"),
            name: "Ada".to_string(),
            title: "CTO".to_string(),
            bio: String::new(),
            order: 1,
            image: None,
            linkedin_url: Some(" https://linkedin.com/in/ada ".to_string()),
            twitter_url: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        assert_eq!(
            member.linkedin_url.as_deref(),
            Some(" https://linkedin.com/in/ada ")
        );
    }

    #[test]
    fn test_media_timestamp_has_millisecond_precision() {
        let uploaded_at = Utc
            .with_ymd_and_hms(2025, 1, 1, 9, 30, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let entry = SiteMediaEntry::from(&MediaFile {
            id: ContentId::from("m"),
            filename: "m.pdf".to_string(),
            original_name: "deck.pdf".to_string(),
            data_url: "data:application/pdf;base64,".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 0,
            uploaded_at,
            updated_at: None,
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["uploadedAt"], "2025-01-01T09:30:00.123Z");
        assert_eq!(json["path"], "images/uploads/m.pdf");
    }
}
