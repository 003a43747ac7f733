//! Notes and the service orchestrating them
//!
//! All note reads and writes go through [`NoteService`], which keeps the note
//! cache and the durable storage in step: reads are served from the cache when
//! possible, writes go to storage first and refresh the cache afterwards. The
//! cache is advisory; when it is unreachable every operation falls back to
//! storage and carries on.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::cache;
use crate::cache::Cache;
use crate::collaborators::AccessType;
use crate::collaborators::Collaborator;
use crate::storage;
use crate::storage::CreateCollaboratorValues;
use crate::storage::CreateNoteValues;
use crate::storage::Storage;
use crate::storage::UpdateNoteValues;
use crate::users::User;

#[derive(Clone, Debug)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub reminder: Option<NaiveDateTime>,
    pub is_archived: bool,
    pub is_trashed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    /// Is this note owned by the given user?
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.user_id == user.id
    }
}

/// The togglable note flags
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoteFlag {
    /// Archived, hidden from the main listing
    Archive,

    /// Trashed, hidden from the main listing
    Trash,
}

/// The cached representation of a note
///
/// A flat snapshot of the fields a read needs. The archive/trash flags are not
/// part of it; snapshot-served reads carry unknown flags.
#[derive(Debug, Deserialize, Serialize)]
pub struct NoteSnapshot {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub reminder: Option<NaiveDateTime>,
    pub user: i64,
}

impl NoteSnapshot {
    /// Create a snapshot from a full note
    fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            description: note.description.clone(),
            color: note.color.clone(),
            reminder: note.reminder,
            user: note.user_id,
        }
    }
}

/// Where a read was served from
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadSource {
    /// Served from the note cache
    Cache,

    /// Served from durable storage
    Store,
}

/// The archive/trash flags of a note
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoteFlags {
    pub is_archived: bool,
    pub is_trashed: bool,
}

/// A note as served by a read
///
/// Cache-served reads come from a [`NoteSnapshot`] and have no flags; only
/// storage-served reads know whether a note is archived or trashed.
#[derive(Clone, Debug)]
pub struct SourcedNote {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub reminder: Option<NaiveDateTime>,
    pub flags: Option<NoteFlags>,
    pub source: ReadSource,
}

impl SourcedNote {
    /// Create a sourced note from a cache snapshot
    fn from_snapshot(snapshot: NoteSnapshot) -> Self {
        Self {
            id: snapshot.id,
            user_id: snapshot.user,
            title: snapshot.title,
            description: snapshot.description,
            color: snapshot.color,
            reminder: snapshot.reminder,
            flags: None,
            source: ReadSource::Cache,
        }
    }

    /// Create a sourced note from a stored note
    fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            description: note.description,
            color: note.color,
            reminder: note.reminder,
            flags: Some(NoteFlags {
                is_archived: note.is_archived,
                is_trashed: note.is_trashed,
            }),
            source: ReadSource::Store,
        }
    }
}

/// Errors from note operations
#[derive(Debug, Error)]
pub enum NoteError {
    /// A required field is missing or empty, nothing was persisted
    #[error("{0}")]
    Validation(&'static str),

    /// Nothing matched the id under the scope of the request
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request clashes with existing state
    #[error("{0}")]
    Conflict(&'static str),

    /// The durable storage failed
    #[error(transparent)]
    Persistence(#[from] storage::Error),
}

/// Result type for all note operations
pub type Result<T> = core::result::Result<T, NoteError>;

/// Orchestrates note reads and writes across the cache and storage
///
/// Storage is authoritative; the cache only ever speeds up reads. A note is
/// cached under its owner's namespace on create and update, never on list.
#[derive(Clone)]
pub struct NoteService<S: Storage, C: Cache> {
    /// Durable storage for notes
    storage: S,

    /// The note cache
    cache: C,

    /// Apply the same ownership scope to every operation
    ///
    /// When disabled the scopes match the service this one replaces: listing
    /// includes shared notes, single reads are owner-only and deletes are not
    /// scoped at all.
    strict_owner_scoping: bool,
}

impl<S: Storage, C: Cache> NoteService<S, C> {
    /// Create a new note service
    pub fn new(storage: S, cache: C, strict_owner_scoping: bool) -> Self {
        Self {
            storage,
            cache,
            strict_owner_scoping,
        }
    }

    /// List all notes visible to a user
    ///
    /// A populated cache namespace is served as-is: no storage round trip, no
    /// archive/trash filtering. The flags of those notes are unknown, which
    /// shows up as [`ReadSource::Cache`] on every entry. An empty or
    /// unreachable cache falls back to storage, without repopulating the
    /// cache; only writes do that.
    pub async fn list_notes(&self, user: &User) -> Result<Vec<SourcedNote>> {
        let user_key = cache::user_key(user.id);

        match self.cache.get_all(&user_key).await {
            Ok(entries) if !entries.is_empty() => match parse_snapshots(entries.values()) {
                Ok(mut notes) => {
                    notes.sort_by_key(|note| note.id);

                    return Ok(notes);
                }
                Err(err) => {
                    tracing::warn!(
                        user_id = user.id,
                        "Unreadable cache namespace, falling back to storage: {err}"
                    );
                }
            },
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    user_id = user.id,
                    "Cache unavailable for list, falling back to storage: {err}"
                );
            }
        }

        let notes = self
            .storage
            .find_all_notes_by_owner_or_collaborator(user)
            .await?;

        Ok(notes.into_iter().map(SourcedNote::from_note).collect())
    }

    /// Get a single note
    ///
    /// A cache hit is served directly. On a miss the note comes from storage,
    /// owner-scoped; with strict scoping a collaborator can fetch it as well,
    /// matching what the listing shows them.
    pub async fn get_note(&self, user: &User, note_id: i64) -> Result<SourcedNote> {
        let user_key = cache::user_key(user.id);
        let note_key = cache::note_key(note_id);

        match self.cache.get_one(&user_key, &note_key).await {
            Ok(Some(serialized)) => match serde_json::from_str::<NoteSnapshot>(&serialized) {
                Ok(snapshot) => return Ok(SourcedNote::from_snapshot(snapshot)),
                Err(err) => {
                    tracing::warn!(
                        user_id = user.id,
                        note_id,
                        "Unreadable cache entry, falling back to storage: {err}"
                    );
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    user_id = user.id,
                    note_id,
                    "Cache unavailable for get, falling back to storage: {err}"
                );
            }
        }

        let note = if self.strict_owner_scoping {
            self.find_note_for_reader(user, note_id).await?
        } else {
            self.storage.find_single_note_by_id(user, note_id).await?
        };

        note.map(SourcedNote::from_note)
            .ok_or(NoteError::NotFound("Note"))
    }

    /// Create a note
    ///
    /// The note is persisted first, then cached under the owner's namespace. A
    /// failing cache write is logged and swallowed; the created note stands.
    pub async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        validate_required(values.title, "Title is required")?;
        validate_required(values.description, "Description is required")?;
        validate_required(values.color, "Color is required")?;

        let note = self.storage.create_note(values).await?;

        self.write_snapshot(&note).await;

        Ok(note)
    }

    /// Update a note
    ///
    /// Owner-scoped. The stored note is updated first, then the cache entry is
    /// overwritten with the fresh snapshot so a following read cannot see the
    /// old field values.
    pub async fn update_note(
        &self,
        user: &User,
        note_id: i64,
        values: &UpdateNoteValues<'_>,
    ) -> Result<Note> {
        let note = self
            .storage
            .find_single_note_by_id(user, note_id)
            .await?
            .ok_or(NoteError::NotFound("Note"))?;

        if let Some(title) = values.title {
            validate_required(title, "Title is required")?;
        }

        if let Some(description) = values.description {
            validate_required(description, "Description is required")?;
        }

        if let Some(color) = values.color {
            validate_required(color, "Color is required")?;
        }

        let note = self.storage.update_note(&note, values).await?;

        self.write_snapshot(&note).await;

        Ok(note)
    }

    /// Delete a note
    ///
    /// The cache entry goes first, unconditionally: a failure between the two
    /// deletes then leaves a cache miss instead of an entry for a note that no
    /// longer exists. Storage scoping follows the policy; without strict
    /// scoping any existing note id is accepted, like the service this one
    /// replaces.
    pub async fn delete_note(&self, user: &User, note_id: i64) -> Result<Note> {
        let user_key = cache::user_key(user.id);
        let note_key = cache::note_key(note_id);

        if let Err(err) = self.cache.delete(&user_key, &note_key).await {
            tracing::warn!(
                user_id = user.id,
                note_id,
                "Could not evict cached note: {err}"
            );
        }

        let note = if self.strict_owner_scoping {
            self.storage.find_single_note_by_id(user, note_id).await?
        } else {
            self.storage.find_single_note_by_id_unchecked(note_id).await?
        };

        let note = note.ok_or(NoteError::NotFound("Note"))?;

        self.storage.delete_note(&note).await?;

        Ok(note)
    }

    /// List the archived notes of a user
    ///
    /// Straight from storage, the cache plays no part in flag-based listings.
    pub async fn list_archived(&self, user: &User) -> Result<Vec<Note>> {
        Ok(self
            .storage
            .find_all_notes_by_owner_filtered(user, Some(true), Some(false))
            .await?)
    }

    /// List the trashed notes of a user
    ///
    /// Straight from storage, the cache plays no part in flag-based listings.
    pub async fn list_trashed(&self, user: &User) -> Result<Vec<Note>> {
        Ok(self
            .storage
            .find_all_notes_by_owner_filtered(user, None, Some(true))
            .await?)
    }

    /// Flip the archive flag of a note
    ///
    /// Owner-scoped, bypasses the cache entirely.
    pub async fn toggle_archive(&self, user: &User, note_id: i64) -> Result<Note> {
        let note = self
            .storage
            .find_single_note_by_id(user, note_id)
            .await?
            .ok_or(NoteError::NotFound("Note"))?;

        Ok(self
            .storage
            .set_note_flag(&note, NoteFlag::Archive, !note.is_archived)
            .await?)
    }

    /// Flip the trash flag of a note
    ///
    /// Owner-scoped, bypasses the cache entirely.
    pub async fn toggle_trash(&self, user: &User, note_id: i64) -> Result<Note> {
        let note = self
            .storage
            .find_single_note_by_id(user, note_id)
            .await?
            .ok_or(NoteError::NotFound("Note"))?;

        Ok(self
            .storage
            .set_note_flag(&note, NoteFlag::Trash, !note.is_trashed)
            .await?)
    }

    /// Share a note with another user
    ///
    /// Only the owner can share. Sharing with yourself, or with a user who
    /// already has access, is rejected before anything is persisted.
    pub async fn grant_access(
        &self,
        user: &User,
        note_id: i64,
        collaborator_id: i64,
        access_type: AccessType,
    ) -> Result<Collaborator> {
        let note = self
            .storage
            .find_single_note_by_id(user, note_id)
            .await?
            .ok_or(NoteError::NotFound("Note"))?;

        if collaborator_id == user.id {
            return Err(NoteError::Conflict("Can not share a note with yourself"));
        }

        let collaborator = self
            .storage
            .find_single_user_by_id(collaborator_id)
            .await?
            .ok_or(NoteError::NotFound("User"))?;

        let existing = self
            .storage
            .find_single_collaborator(note.id, collaborator.id)
            .await?;

        if existing.is_some() {
            return Err(NoteError::Conflict("User is already a collaborator"));
        }

        let values = CreateCollaboratorValues {
            note: &note,
            user: &collaborator,
            access_type,
        };

        Ok(self.storage.create_collaborator(&values).await?)
    }

    /// Revoke a user's access to a note
    ///
    /// Only the owner can revoke. Revoking access that was never granted is
    /// indistinguishable from success.
    pub async fn revoke_access(
        &self,
        user: &User,
        note_id: i64,
        collaborator_id: i64,
    ) -> Result<Note> {
        let note = self
            .storage
            .find_single_note_by_id(user, note_id)
            .await?
            .ok_or(NoteError::NotFound("Note"))?;

        self.storage
            .delete_collaborator(note.id, collaborator_id)
            .await?;

        Ok(note)
    }

    /// Find a note for a reading user, owner or collaborator
    async fn find_note_for_reader(&self, user: &User, note_id: i64) -> Result<Option<Note>> {
        let note = self.storage.find_single_note_by_id_unchecked(note_id).await?;

        if let Some(note) = note {
            if note.is_owned_by(user) {
                return Ok(Some(note));
            }

            let grant = self.storage.find_single_collaborator(note.id, user.id).await?;

            Ok(grant.map(|_| note))
        } else {
            Ok(None)
        }
    }

    /// Write the cache snapshot of a note under its owner's namespace
    ///
    /// Cache failures do not fail the surrounding write, the stored note is
    /// what counts.
    async fn write_snapshot(&self, note: &Note) {
        let serialized =
            serde_json::to_string(&NoteSnapshot::from_note(note)).expect("Serializable snapshot");

        let user_key = cache::user_key(note.user_id);
        let note_key = cache::note_key(note.id);

        if let Err(err) = self.cache.upsert(&user_key, &note_key, &serialized).await {
            tracing::warn!(
                user_id = note.user_id,
                note_id = note.id,
                "Could not cache note: {err}"
            );
        }
    }
}

/// Reject empty required fields
fn validate_required(value: &str, message: &'static str) -> Result<()> {
    if value.is_empty() {
        Err(NoteError::Validation(message))
    } else {
        Ok(())
    }
}

/// Parse a batch of serialized snapshots
fn parse_snapshots<'a, I>(serialized: I) -> core::result::Result<Vec<SourcedNote>, serde_json::Error>
where
    I: Iterator<Item = &'a String>,
{
    serialized
        .map(|entry| serde_json::from_str::<NoteSnapshot>(entry).map(SourcedNote::from_snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::cache;
    use crate::storage;
    use crate::storage::CreateUserValues;

    use super::*;

    /// A cache that is never reachable
    #[derive(Clone)]
    struct UnavailableCache;

    #[async_trait]
    impl Cache for UnavailableCache {
        async fn get_all(&self, _user_key: &str) -> cache::Result<HashMap<String, String>> {
            Err(cache::Error::Unavailable(String::from("no route")))
        }

        async fn get_one(&self, _user_key: &str, _note_key: &str) -> cache::Result<Option<String>> {
            Err(cache::Error::Unavailable(String::from("no route")))
        }

        async fn upsert(&self, _user_key: &str, _note_key: &str, _value: &str) -> cache::Result<()> {
            Err(cache::Error::Unavailable(String::from("no route")))
        }

        async fn delete(&self, _user_key: &str, _note_key: &str) -> cache::Result<()> {
            Err(cache::Error::Unavailable(String::from("no route")))
        }
    }

    async fn test_user<S: Storage>(storage: &S, username: &str) -> User {
        let session_id = Uuid::new_v4();
        let email = format!("{username}@example.com");

        let values = CreateUserValues {
            session_id: &session_id,
            username,
            email: &email,
            hashed_password: "not-a-real-hash",
        };

        storage.create_user(&values).await.unwrap()
    }

    async fn create_note<S: Storage, C: Cache>(
        service: &NoteService<S, C>,
        user: &User,
        title: &str,
        color: &str,
    ) -> Note {
        let values = CreateNoteValues {
            user,
            title,
            description: "Some description",
            color,
            reminder: None,
        };

        service.create_note(&values).await.unwrap()
    }

    fn no_changes<'a>() -> UpdateNoteValues<'a> {
        UpdateNoteValues {
            title: None,
            description: None,
            color: None,
            reminder: None,
        }
    }

    #[tokio::test]
    async fn test_read_through() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache, false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        // create populated the cache, the read is served from it
        let read = service.get_note(&user, note.id).await.unwrap();
        assert_eq!(ReadSource::Cache, read.source);
        assert_eq!("Groceries".to_string(), read.title);
        assert!(read.flags.is_none());

        // same storage behind an empty cache, the read now comes from storage
        let cold = NoteService::new(storage.clone(), cache::setup(), false);
        let read = cold.get_note(&user, note.id).await.unwrap();
        assert_eq!(ReadSource::Store, read.source);
        assert_eq!("Groceries".to_string(), read.title);
        assert_eq!(
            Some(NoteFlags {
                is_archived: false,
                is_trashed: false
            }),
            read.flags
        );
    }

    #[tokio::test]
    async fn test_update_overwrites_cache() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache, false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        let color = String::from("Blue");
        let values = UpdateNoteValues {
            color: Some(&color),
            ..no_changes()
        };

        service.update_note(&user, note.id, &values).await.unwrap();

        // still cache-served, and not stale
        let read = service.get_note(&user, note.id).await.unwrap();
        assert_eq!(ReadSource::Cache, read.source);
        assert_eq!("Blue".to_string(), read.color);
    }

    #[tokio::test]
    async fn test_delete_removes_cache_and_storage() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache.clone(), false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        service.delete_note(&user, note.id).await.unwrap();

        let entry = note_cache
            .get_one(&cache::user_key(user.id), &cache::note_key(note.id))
            .await
            .unwrap();
        assert!(entry.is_none());

        let stored = storage.find_single_note_by_id_unchecked(note.id).await.unwrap();
        assert!(stored.is_none());

        let result = service.get_note(&user, note.id).await;
        assert!(matches!(result, Err(NoteError::NotFound("Note"))));
    }

    #[tokio::test]
    async fn test_unavailable_cache_falls_back_to_storage() {
        let storage = storage::setup().await;
        let service = NoteService::new(storage.clone(), UnavailableCache, false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        // every read still works, served from storage
        let read = service.get_note(&user, note.id).await.unwrap();
        assert_eq!(ReadSource::Store, read.source);
        assert_eq!("Groceries".to_string(), read.title);

        let notes = service.list_notes(&user).await.unwrap();
        assert_eq!(1, notes.len());
        assert_eq!(ReadSource::Store, notes[0].source);

        // and delete still removes the note
        service.delete_note(&user, note.id).await.unwrap();
        let stored = storage.find_single_note_by_id_unchecked(note.id).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_cached_list_skips_flag_filtering() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache, false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;
        create_note(&service, &user, "Cleaning", "Yellow").await;

        let archived = service.toggle_archive(&user, note.id).await.unwrap();
        assert!(archived.is_archived);

        // the cache namespace is populated and knows nothing about flags, the
        // archived note is still listed
        let notes = service.list_notes(&user).await.unwrap();
        assert_eq!(2, notes.len());
        assert!(notes.iter().all(|note| note.source == ReadSource::Cache));
        assert!(notes.iter().all(|note| note.flags.is_none()));

        // storage does filter, a cold cache drops the archived note
        let cold = NoteService::new(storage.clone(), cache::setup(), false);
        let notes = cold.list_notes(&user).await.unwrap();
        assert_eq!(1, notes.len());
        assert_eq!("Cleaning".to_string(), notes[0].title);

        // and the archived listing serves it, flags known
        let archived = service.list_archived(&user).await.unwrap();
        assert_eq!(1, archived.len());
        assert_eq!("Groceries".to_string(), archived[0].title);
        assert!(archived[0].is_archived);
    }

    #[tokio::test]
    async fn test_list_does_not_repopulate_cache() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache.clone(), false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        // wipe the only entry, then list from storage
        note_cache
            .delete(&cache::user_key(user.id), &cache::note_key(note.id))
            .await
            .unwrap();

        let notes = service.list_notes(&user).await.unwrap();
        assert_eq!(1, notes.len());
        assert_eq!(ReadSource::Store, notes[0].source);

        // the namespace is still empty
        let entries = note_cache.get_all(&cache::user_key(user.id)).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_fields() {
        let storage = storage::setup().await;
        let service = NoteService::new(storage.clone(), cache::setup(), false);

        let user = test_user(&storage, "ada").await;

        let values = CreateNoteValues {
            user: &user,
            title: "",
            description: "Some description",
            color: "Green",
            reminder: None,
        };

        let result = service.create_note(&values).await;
        assert!(matches!(result, Err(NoteError::Validation("Title is required"))));

        // nothing was persisted
        let notes = storage.find_all_notes_by_owner_or_collaborator(&user).await.unwrap();
        assert!(notes.is_empty());

        // updates validate provided fields the same way
        let note = create_note(&service, &user, "Groceries", "Green").await;

        let color = String::new();
        let values = UpdateNoteValues {
            color: Some(&color),
            ..no_changes()
        };

        let result = service.update_note(&user, note.id, &values).await;
        assert!(matches!(result, Err(NoteError::Validation("Color is required"))));
    }

    #[tokio::test]
    async fn test_update_not_found_beats_validation() {
        let storage = storage::setup().await;
        let service = NoteService::new(storage.clone(), cache::setup(), false);

        let user = test_user(&storage, "ada").await;

        // invalid fields on a missing note still report the missing note
        let color = String::new();
        let values = UpdateNoteValues {
            color: Some(&color),
            ..no_changes()
        };

        let result = service.update_note(&user, 4321, &values).await;
        assert!(matches!(result, Err(NoteError::NotFound("Note"))));
    }

    #[tokio::test]
    async fn test_self_share_is_a_conflict() {
        let storage = storage::setup().await;
        let service = NoteService::new(storage.clone(), cache::setup(), false);

        let user = test_user(&storage, "ada").await;
        let note = create_note(&service, &user, "Groceries", "Green").await;

        let result = service
            .grant_access(&user, note.id, user.id, AccessType::ReadWrite)
            .await;
        assert!(matches!(result, Err(NoteError::Conflict(_))));

        // nothing was persisted
        let grant = storage.find_single_collaborator(note.id, user.id).await.unwrap();
        assert!(grant.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_grant_is_a_conflict() {
        let storage = storage::setup().await;
        let service = NoteService::new(storage.clone(), cache::setup(), false);

        let ada = test_user(&storage, "ada").await;
        let grace = test_user(&storage, "grace").await;
        let note = create_note(&service, &ada, "Groceries", "Green").await;

        service
            .grant_access(&ada, note.id, grace.id, AccessType::ReadOnly)
            .await
            .unwrap();

        let result = service
            .grant_access(&ada, note.id, grace.id, AccessType::ReadWrite)
            .await;
        assert!(matches!(result, Err(NoteError::Conflict(_))));

        // revoking twice is fine
        service.revoke_access(&ada, note.id, grace.id).await.unwrap();
        service.revoke_access(&ada, note.id, grace.id).await.unwrap();

        let grant = storage.find_single_collaborator(note.id, grace.id).await.unwrap();
        assert!(grant.is_none());
    }

    #[tokio::test]
    async fn test_scoping_of_single_reads() {
        let storage = storage::setup().await;

        let legacy = NoteService::new(storage.clone(), cache::setup(), false);
        let strict = NoteService::new(storage.clone(), cache::setup(), true);

        let ada = test_user(&storage, "ada").await;
        let grace = test_user(&storage, "grace").await;

        let note = create_note(&legacy, &ada, "Groceries", "Green").await;
        legacy
            .grant_access(&ada, note.id, grace.id, AccessType::ReadOnly)
            .await
            .unwrap();

        // both modes list the shared note for the collaborator
        let notes = legacy.list_notes(&grace).await.unwrap();
        assert_eq!(1, notes.len());

        // a single read is owner-only without strict scoping
        let result = legacy.get_note(&grace, note.id).await;
        assert!(matches!(result, Err(NoteError::NotFound("Note"))));

        // strict scoping lines the single read up with the listing
        let read = strict.get_note(&grace, note.id).await.unwrap();
        assert_eq!("Groceries".to_string(), read.title);

        // a stranger sees nothing either way
        let eve = test_user(&storage, "eve").await;
        assert!(legacy.get_note(&eve, note.id).await.is_err());
        assert!(strict.get_note(&eve, note.id).await.is_err());
    }

    #[tokio::test]
    async fn test_scoping_of_deletes() {
        let storage = storage::setup().await;

        let legacy = NoteService::new(storage.clone(), cache::setup(), false);

        let ada = test_user(&storage, "ada").await;
        let eve = test_user(&storage, "eve").await;

        // without strict scoping anybody with the id can delete
        let note = create_note(&legacy, &ada, "Groceries", "Green").await;
        legacy.delete_note(&eve, note.id).await.unwrap();

        let stored = storage.find_single_note_by_id_unchecked(note.id).await.unwrap();
        assert!(stored.is_none());

        // strict scoping only lets the owner delete
        let strict = NoteService::new(storage.clone(), cache::setup(), true);

        let note = create_note(&strict, &ada, "Groceries", "Green").await;
        let result = strict.delete_note(&eve, note.id).await;
        assert!(matches!(result, Err(NoteError::NotFound("Note"))));

        strict.delete_note(&ada, note.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_update_delete_walkthrough() {
        let storage = storage::setup().await;
        let note_cache = cache::setup();
        let service = NoteService::new(storage.clone(), note_cache.clone(), false);

        let user = test_user(&storage, "ada").await;

        let values = CreateNoteValues {
            user: &user,
            title: "A",
            description: "B",
            color: "Green",
            reminder: None,
        };

        let note = service.create_note(&values).await.unwrap();

        // snapshot sits under the composite keys
        let entry = note_cache
            .get_one(&cache::user_key(user.id), &cache::note_key(note.id))
            .await
            .unwrap()
            .unwrap();

        let snapshot = serde_json::from_str::<NoteSnapshot>(&entry).unwrap();
        assert_eq!(note.id, snapshot.id);
        assert_eq!("Green".to_string(), snapshot.color);
        assert_eq!(user.id, snapshot.user);

        let color = String::from("Blue");
        let values = UpdateNoteValues {
            color: Some(&color),
            ..no_changes()
        };

        service.update_note(&user, note.id, &values).await.unwrap();

        let entry = note_cache
            .get_one(&cache::user_key(user.id), &cache::note_key(note.id))
            .await
            .unwrap()
            .unwrap();

        let snapshot = serde_json::from_str::<NoteSnapshot>(&entry).unwrap();
        assert_eq!("Blue".to_string(), snapshot.color);

        service.delete_note(&user, note.id).await.unwrap();

        let entry = note_cache
            .get_one(&cache::user_key(user.id), &cache::note_key(note.id))
            .await
            .unwrap();
        assert!(entry.is_none());

        let stored = storage.find_single_note_by_id_unchecked(note.id).await.unwrap();
        assert!(stored.is_none());
    }
}
