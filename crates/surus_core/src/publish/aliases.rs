//! Legacy field aliases.
//!
//! Older versions of the public site read some fields under snake_case or
//! alternative names. Published documents carry both the canonical field and
//! its legacy copy, placed right after the canonical one. Dropping an entry
//! from [`LEGACY_ALIASES`] is all it takes to stop emitting it.

use serde_json::{Map, Value};

use crate::content::CollectionKind;

/// A legacy copy of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyAlias {
    /// Collection the field belongs to
    pub kind: CollectionKind,
    /// Current field name
    pub canonical: &'static str,
    /// Older name the site may still read
    pub legacy: &'static str,
}

const fn alias(kind: CollectionKind, canonical: &'static str, legacy: &'static str) -> LegacyAlias {
    LegacyAlias {
        kind,
        canonical,
        legacy,
    }
}

/// Every legacy copy emitted in published documents.
pub const LEGACY_ALIASES: &[LegacyAlias] = &[
    alias(CollectionKind::BlogPosts, "content", "body"),
    alias(CollectionKind::PodcastEpisodes, "episodeNumber", "episode_number"),
    alias(CollectionKind::PodcastEpisodes, "description", "summary"),
    alias(CollectionKind::PodcastEpisodes, "description", "body"),
    alias(CollectionKind::PodcastEpisodes, "guestTitle", "guest_title"),
    alias(CollectionKind::PodcastEpisodes, "audioUrl", "libsyn_url"),
    alias(CollectionKind::PodcastEpisodes, "spotifyUrl", "spotify_url"),
    alias(CollectionKind::PodcastEpisodes, "appleUrl", "apple_url"),
    alias(CollectionKind::PodcastEpisodes, "amazonUrl", "amazon_url"),
    alias(CollectionKind::PodcastEpisodes, "youtubeUrl", "youtube_url"),
];

fn aliases_for(kind: CollectionKind) -> impl Iterator<Item = &'static LegacyAlias> {
    LEGACY_ALIASES.iter().filter(move |a| a.kind == kind)
}

/// Copy canonical fields to their legacy names, each right after its canonical field.
///
/// Absent canonical fields produce no legacy copy. Non-objects pass through.
pub fn add_legacy_fields(kind: CollectionKind, value: Value) -> Value {
    let Value::Object(fields) = value else {
        return value;
    };

    let mut out = Map::with_capacity(fields.len());
    for (key, field) in fields {
        let copies: Vec<_> = aliases_for(kind)
            .filter(|a| a.canonical == key)
            .map(|a| (a.legacy, field.clone()))
            .collect();
        out.insert(key, field);
        for (legacy, copy) in copies {
            out.insert(legacy.to_string(), copy);
        }
    }
    Value::Object(out)
}

/// Fold legacy fields back into canonical ones before parsing external JSON.
///
/// A legacy value fills the canonical field only when the canonical field is
/// missing; legacy keys are always removed afterwards.
pub fn resolve_legacy_fields(kind: CollectionKind, value: Value) -> Value {
    let Value::Object(mut fields) = value else {
        return value;
    };

    for alias in aliases_for(kind) {
        if let Some(legacy) = fields.remove(alias.legacy)
            && !fields.contains_key(alias.canonical)
            && !legacy.is_null()
        {
            fields.insert(alias.canonical.to_string(), legacy);
        }
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_legacy_copy_follows_canonical_field() {
        let value = json!({"title": "T", "content": "Hi", "tags": []});
        let out = add_legacy_fields(CollectionKind::BlogPosts, value);
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["title", "content", "body", "tags"]);
        assert_eq!(out["body"], "Hi");
    }

    #[test]
    fn test_one_field_can_have_several_copies() {
        let value = json!({"description": "Notes"});
        let out = add_legacy_fields(CollectionKind::PodcastEpisodes, value);
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["description", "summary", "body"]);
    }

    #[test]
    fn test_missing_canonical_field_emits_no_copy() {
        let out = add_legacy_fields(CollectionKind::PodcastEpisodes, json!({"title": "T"}));
        assert!(out.get("spotify_url").is_none());
    }

    #[test]
    fn test_team_has_no_legacy_fields() {
        let value = json!({"name": "Ada", "bio": "x"});
        assert_eq!(add_legacy_fields(CollectionKind::TeamMembers, value.clone()), value);
    }

    #[test]
    fn test_resolve_prefers_canonical_and_drops_legacy() {
        let value = json!({
            "episodeNumber": 3,
            "episode_number": 4,
            "spotify_url": "https://open.spotify.com/e",
            "summary": "Show notes"
        });
        let out = resolve_legacy_fields(CollectionKind::PodcastEpisodes, value);
        assert_eq!(
            out,
            json!({
                "episodeNumber": 3,
                "spotifyUrl": "https://open.spotify.com/e",
                "description": "Show notes"
            })
        );
    }
}
