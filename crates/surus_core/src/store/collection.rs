//! CRUD over one collection, plus the degrade ladder used when the area is full.

use std::collections::HashSet;
use std::marker::PhantomData;

use chrono::Utc;
use log::{debug, warn};

use crate::content::Entity;
use crate::error::{CmsError, Result};
use crate::id::ContentId;
use crate::storage::{KeyValueStore, StorageError};

/// Outcome of a single attempt to persist a collection.
enum Attempt {
    Written,
    Full,
}

/// One collection inside the key-value area.
///
/// Obtained from [`ContentStore`](super::ContentStore); borrows the store's
/// backend and reads the whole collection on every call.
pub struct Collection<'a, S: KeyValueStore, T: Entity> {
    kv: &'a S,
    _entity: PhantomData<T>,
}

impl<'a, S: KeyValueStore, T: Entity> Collection<'a, S, T> {
    pub(crate) fn new(kv: &'a S) -> Self {
        Self {
            kv,
            _entity: PhantomData,
        }
    }

    fn key(&self) -> &'static str {
        T::KIND.storage_key()
    }

    /// All entities, in stored order.
    ///
    /// Never fails: an absent key, an unreadable backend or a value that does
    /// not parse are all reported as an empty collection.
    pub fn list(&self) -> Vec<T> {
        let raw = match self.kv.get(self.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read {}: {}", T::KIND.plural(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    "Stored {} are corrupt, treating as empty: {}",
                    T::KIND.plural(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// The entity with `id`, if present.
    pub fn get(&self, id: &ContentId) -> Option<T> {
        self.list().into_iter().find(|row| row.id() == id)
    }

    /// Number of stored entities.
    pub fn count(&self) -> usize {
        self.list().len()
    }

    /// Create an entity from a draft and persist the collection.
    ///
    /// Returns the entity as it was actually stored, which may have trimmed
    /// text if the area was close to full.
    pub fn create(&self, draft: T::Draft) -> Result<T> {
        let entity = T::from_draft(ContentId::generate(), draft, Utc::now());
        let id = entity.id().clone();

        let mut rows = self.list();
        rows.push(entity);
        self.commit(rows, &id)
    }

    /// Merge `patch` over the entity with `id` and persist the collection.
    pub fn update(&self, id: &ContentId, patch: T::Patch) -> Result<T> {
        let mut rows = self.list();
        let Some(row) = rows.iter_mut().find(|row| row.id() == id) else {
            return Err(CmsError::NotFound {
                kind: T::KIND,
                id: id.clone(),
            });
        };
        row.apply_patch(patch);
        row.touch(Utc::now());

        self.commit(rows, id)
    }

    /// Remove the entity with `id`. Removing an unknown id succeeds.
    pub fn delete(&self, id: &ContentId) -> Result<()> {
        let mut rows = self.list();
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            debug!("{} {} already absent", T::KIND.singular(), id);
            return Ok(());
        }

        match self.attempt(&rows)? {
            Attempt::Written => Ok(()),
            Attempt::Full => Err(CmsError::StorageFull { kind: T::KIND }),
        }
    }

    /// Overwrite the whole collection without any degradation.
    pub fn replace_all(&self, rows: &[T]) -> Result<()> {
        match self.attempt(rows)? {
            Attempt::Written => Ok(()),
            Attempt::Full => Err(CmsError::StorageFull { kind: T::KIND }),
        }
    }

    /// Remove the collection's key entirely.
    pub fn clear(&self) -> Result<()> {
        self.kv.remove(self.key())?;
        Ok(())
    }

    /// Persist `rows`, degrading the write step by step if the area is full.
    ///
    /// Ladder: trim early when usage is high, full write, trimmed write,
    /// important recent rows only, the triggering row only, then fail with
    /// [`CmsError::StorageFull`]. The row with id `trigger` is present in every
    /// attempt and is returned as it was persisted.
    pub(crate) fn commit(&self, mut rows: Vec<T>, trigger: &ContentId) -> Result<T> {
        let kind = T::KIND;
        let mut trimmed = false;

        if self.kv.usage()?.is_near_capacity() {
            trimmed = true;
            if trim_rows(&mut rows) > 0 {
                debug!("Storage above threshold, trimmed {} before write", kind.plural());
            }
        }

        if let Attempt::Written = self.attempt(&rows)? {
            return Self::persisted(rows, trigger);
        }

        if !trimmed {
            let count = trim_rows(&mut rows);
            if count > 0
                && let Attempt::Written = self.attempt(&rows)?
            {
                warn!(
                    "Storage full: saved {} with {} rows trimmed",
                    kind.plural(),
                    count
                );
                return Self::persisted(rows, trigger);
            }
        }

        let before = rows.len();
        narrow_rows(&mut rows, trigger, kind.narrow_limit());
        if rows.len() < before
            && let Attempt::Written = self.attempt(&rows)?
        {
            warn!(
                "Storage full: kept {} of {} {}",
                rows.len(),
                before,
                kind.plural()
            );
            return Self::persisted(rows, trigger);
        }

        rows.retain(|row| row.id() == trigger);
        if let Attempt::Written = self.attempt(&rows)? {
            warn!(
                "Storage full: only the latest {} was kept, older entries were evicted",
                kind.singular().to_lowercase()
            );
            return Self::persisted(rows, trigger);
        }

        warn!("Storage full: could not save {}", kind.singular().to_lowercase());
        Err(CmsError::StorageFull { kind })
    }

    /// Write the collection and read it back.
    ///
    /// A capacity failure is reported as [`Attempt::Full`]; the backend leaves
    /// the previously stored value in place in that case.
    fn attempt(&self, rows: &[T]) -> Result<Attempt> {
        let value = serde_json::to_string(rows)?;
        match self.kv.set(self.key(), &value) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { .. }) => return Ok(Attempt::Full),
            Err(e) => return Err(e.into()),
        }

        if self.kv.get(self.key())?.as_deref() != Some(value.as_str()) {
            return Err(StorageError::Unavailable(format!(
                "{} did not read back as written",
                self.key()
            ))
            .into());
        }

        debug!("Saved {} {}", rows.len(), T::KIND.plural());
        Ok(Attempt::Written)
    }

    fn persisted(rows: Vec<T>, trigger: &ContentId) -> Result<T> {
        rows.into_iter()
            .find(|row| row.id() == trigger)
            .ok_or_else(|| CmsError::NotFound {
                kind: T::KIND,
                id: trigger.clone(),
            })
    }
}

/// Trim every row; returns how many changed.
fn trim_rows<T: Entity>(rows: &mut [T]) -> usize {
    rows.iter_mut()
        .map(|row| row.trim_for_storage())
        .filter(|changed| *changed)
        .count()
}

/// Keep the important rows, then at most `limit` of the most recently touched.
///
/// The row with id `trigger` always survives. Stored order is preserved.
fn narrow_rows<T: Entity>(rows: &mut Vec<T>, trigger: &ContentId, limit: usize) {
    rows.retain(|row| row.id() == trigger || row.keep_when_narrowing());

    let mut recent: Vec<&T> = rows.iter().filter(|row| row.id() != trigger).collect();
    recent.sort_by_key(|row| std::cmp::Reverse(row.touched_at()));
    let keep: HashSet<ContentId> = recent
        .into_iter()
        .take(limit.saturating_sub(1))
        .map(|row| row.id().clone())
        .collect();

    rows.retain(|row| row.id() == trigger || keep.contains(row.id()));
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::content::{
        BlogPost, BlogPostPatch, NewBlogPost, NewTeamMember, TeamMember, TeamMemberPatch,
    };
    use crate::storage::MemoryKeyValueStore;
    use crate::store::ContentStore;

    fn member(name: &str, active: bool, bio_len: usize) -> NewTeamMember {
        NewTeamMember {
            name: name.to_string(),
            title: "Partner".to_string(),
            bio: "b".repeat(bio_len),
            active,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_then_get_round_trips() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let created = store
            .blog_posts()
            .create(NewBlogPost {
                title: "Launch Day".to_string(),
                tags: vec!["news".to_string()],
                published: true,
                ..Default::default()
            })
            .unwrap();

        let fetched = store.blog_posts().get(&created.id).unwrap();
        assert_eq!(fetched, created);
        assert!(!created.id.as_str().is_empty());
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let err = store
            .blog_posts()
            .update(&ContentId::from("nope"), BlogPostPatch::default())
            .unwrap_err();
        assert!(matches!(err, CmsError::NotFound { .. }));
        assert_eq!(err.to_string(), "Blog post not found");
    }

    #[test]
    fn test_update_restamps_and_merges() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let posts = store.blog_posts();
        let created = posts
            .create(NewBlogPost {
                title: "Old".to_string(),
                author: "Kim".to_string(),
                ..Default::default()
            })
            .unwrap();

        let updated = posts
            .update(
                &created.id,
                BlogPostPatch {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.author, "Kim");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let posts = store.blog_posts();
        let created = posts.create(NewBlogPost::default()).unwrap();

        posts.delete(&created.id).unwrap();
        posts.delete(&created.id).unwrap();
        assert!(posts.list().is_empty());
    }

    #[test]
    fn test_corrupt_key_does_not_affect_other_collections() {
        let kv = MemoryKeyValueStore::new();
        let store = ContentStore::new(kv.clone());
        store.team_members().create(member("Grace", true, 10)).unwrap();

        let kv = kv.with_raw("surus_cms_blog_posts", "{not json");
        let store = ContentStore::new(kv);
        assert!(store.blog_posts().list().is_empty());
        assert_eq!(store.team_members().list().len(), 1);
    }

    #[test]
    fn test_full_area_trims_before_evicting() {
        let store = ContentStore::new(MemoryKeyValueStore::with_capacity(3_000));
        let team = store.team_members();
        team.create(member("Ada", true, 1_400)).unwrap();

        // Second long bio does not fit untrimmed, but fits once bios are capped
        let created = team.create(member("Grace", true, 1_400)).unwrap();
        assert_eq!(created.bio.chars().count(), TeamMember::BIO_CEILING);

        let rows = team.list();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.bio.chars().count() == TeamMember::BIO_CEILING));
    }

    #[test]
    fn test_narrowing_drops_inactive_members_first() {
        // Room for four members, not five
        let store = ContentStore::new(MemoryKeyValueStore::with_capacity(1_450));
        let team = store.team_members();
        let keeper = team.create(member("Active", true, 100)).unwrap();
        for i in 0..3 {
            team.create(member(&format!("Former {}", i), false, 100))
                .unwrap();
        }
        assert_eq!(team.count(), 4);

        let created = team.create(member("New", true, 100)).unwrap();

        let rows = team.list();
        assert!(rows.iter().any(|m| m.id == created.id));
        assert!(rows.iter().any(|m| m.id == keeper.id));
        assert!(rows.iter().all(|m| m.active));
    }

    #[test]
    fn test_trigger_only_write_when_nothing_else_fits() {
        let store = ContentStore::new(MemoryKeyValueStore::with_capacity(700));
        let team = store.team_members();
        team.create(member("Ada", true, 300)).unwrap();

        let created = team.create(member("Grace", true, 300)).unwrap();
        let rows = team.list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, created.id);
    }

    #[test]
    fn test_terminal_failure_keeps_previous_state() {
        let kv = MemoryKeyValueStore::with_capacity(400).with_raw("filler", &"x".repeat(250));
        let store = ContentStore::new(kv);
        let team = store.team_members();

        let err = team.create(member("Grace", true, 400)).unwrap_err();
        assert!(err.is_storage_full());
        assert!(err.to_string().contains("publish existing content"));
        assert!(team.list().is_empty());
    }

    #[test]
    fn test_delete_frees_space_in_an_overfull_area() {
        let kv = MemoryKeyValueStore::with_capacity(2_000);
        let store = ContentStore::new(kv.clone());
        let team = store.team_members();
        let ada = team.create(member("Ada", true, 300)).unwrap();
        team.create(member("Grace", true, 300)).unwrap();

        let store = ContentStore::new(kv.with_raw("filler", &"x".repeat(1_800)));
        let team = store.team_members();
        assert!(store.usage().unwrap().used > 2_000);

        team.delete(&ada.id).unwrap();
        assert_eq!(team.count(), 1);
    }

    #[test]
    fn test_update_patch_can_deactivate() {
        let store = ContentStore::new(MemoryKeyValueStore::new());
        let team = store.team_members();
        let created = team.create(member("Ada", true, 10)).unwrap();
        let updated = team
            .update(
                &created.id,
                TeamMemberPatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.active);
    }

    #[test]
    fn test_narrow_rows_keeps_most_recent_and_trigger() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut rows: Vec<BlogPost> = (0..15)
            .map(|i| {
                BlogPost::from_draft(
                    ContentId::from(format!("p{}", i)),
                    NewBlogPost::default(),
                    base + Duration::days(i),
                )
            })
            .collect();

        // Oldest row triggers the write
        let trigger = ContentId::from("p0");
        narrow_rows(&mut rows, &trigger, 10);

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].id, trigger);
        assert!(rows.iter().any(|r| r.id.as_str() == "p14"));
        assert!(!rows.iter().any(|r| r.id.as_str() == "p5"));
    }
}
