//! All things related to the storage of users, notes and labels

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::collaborators::AccessType;
use crate::collaborators::Collaborator;
use crate::labels::Label;
use crate::notes::Note;
use crate::notes::NoteFlag;
use crate::users::User;

#[cfg(not(feature = "postgres"))]
use memory::Memory;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The username
    pub username: &'a str,

    /// The email address
    pub email: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to change a password of a user
pub struct ChangePasswordValues<'a> {
    /// New session ID to invalidate current tokens
    pub session_id: &'a Uuid,

    /// The new hashed password
    pub hashed_password: &'a str,
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// User creating the note
    pub user: &'a User,

    /// Title of the note
    pub title: &'a str,

    /// Body of the note
    pub description: &'a str,

    /// Display color of the note
    pub color: &'a str,

    /// Optional reminder moment
    pub reminder: Option<&'a NaiveDateTime>,
}

/// Values to update a Note
///
/// Absent fields keep their stored value
pub struct UpdateNoteValues<'a> {
    /// New title of the note
    pub title: Option<&'a String>,

    /// New body of the note
    pub description: Option<&'a String>,

    /// New display color of the note
    pub color: Option<&'a String>,

    /// New reminder moment
    pub reminder: Option<&'a NaiveDateTime>,
}

/// Values to create a Label
pub struct CreateLabelValues<'a> {
    /// User creating the label
    pub user: &'a User,

    /// Name of the label
    pub name: &'a str,
}

/// Values to update a Label
pub struct UpdateLabelValues<'a> {
    /// New name of the label
    pub name: Option<&'a String>,
}

/// Values to create a Collaborator
pub struct CreateCollaboratorValues<'a> {
    /// The note being shared
    pub note: &'a Note,

    /// The user gaining access
    pub user: &'a User,

    /// The level of access
    pub access_type: AccessType,
}

/// Possible audit trail entry types
pub enum AuditEntry<'a> {
    /// User is created
    CreateUser(&'a User),

    /// User has a changed password
    ChangePassword(&'a User),

    /// Note is created
    CreateNote(&'a Note),

    /// Note is updated
    UpdateNote(&'a Note),

    /// Note is deleted
    DeleteNote(&'a Note),

    /// Note archive flag is flipped
    ArchiveNote(&'a Note),

    /// Note trash flag is flipped
    TrashNote(&'a Note),

    /// Label is created
    CreateLabel(&'a Label),

    /// Label is updated
    UpdateLabel(&'a Label),

    /// Label is deleted
    DeleteLabel(&'a Label),

    /// Note is shared with a user
    CreateCollaborator(&'a Collaborator),

    /// Access of a user to a note is revoked
    DeleteCollaborator(&'a Note, i64),
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find a single user by its username
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Find a single user by its ID
    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&self, values: &CreateUserValues) -> Result<User>;

    /// Change the password of a user
    async fn change_password(&self, user: &User, values: &ChangePasswordValues) -> Result<User>;

    /// Find a single note by its ID
    ///
    /// Scoped to the owner
    async fn find_single_note_by_id(&self, owner: &User, note_id: i64) -> Result<Option<Note>>;

    /// Find a single note by its ID
    ///
    /// DOES NOT check ownership, handle with care
    async fn find_single_note_by_id_unchecked(&self, note_id: i64) -> Result<Option<Note>>;

    /// Find all notes a user owns or has access to as a collaborator
    ///
    /// Excludes archived and trashed notes, ordered by ID
    async fn find_all_notes_by_owner_or_collaborator(&self, user: &User) -> Result<Vec<Note>>;

    /// Find all notes of an owner, filtered on their flags
    ///
    /// A `None` filter matches both flag values, ordered by ID
    async fn find_all_notes_by_owner_filtered(
        &self,
        owner: &User,
        is_archived: Option<bool>,
        is_trashed: Option<bool>,
    ) -> Result<Vec<Note>>;

    /// Create a note
    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note>;

    /// Update a note
    async fn update_note(&self, note: &Note, values: &UpdateNoteValues) -> Result<Note>;

    /// Delete a note, and the access of its collaborators
    async fn delete_note(&self, note: &Note) -> Result<()>;

    /// Set a single flag of a note
    async fn set_note_flag(&self, note: &Note, flag: NoteFlag, value: bool) -> Result<Note>;

    /// Find the access of a user to a note
    async fn find_single_collaborator(
        &self,
        note_id: i64,
        user_id: i64,
    ) -> Result<Option<Collaborator>>;

    /// Grant a user access to a note
    async fn create_collaborator(&self, values: &CreateCollaboratorValues) -> Result<Collaborator>;

    /// Revoke the access of a user to a note
    ///
    /// Revoking absent access is a no-op
    async fn delete_collaborator(&self, note_id: i64, user_id: i64) -> Result<()>;

    /// Find all labels of a user, ordered by ID
    async fn find_all_labels_by_user(&self, user: &User) -> Result<Vec<Label>>;

    /// Find a single label by its ID
    ///
    /// Scoped to the owner
    async fn find_single_label_by_id(&self, owner: &User, label_id: i64) -> Result<Option<Label>>;

    /// Create a label
    async fn create_label(&self, values: &CreateLabelValues) -> Result<Label>;

    /// Update a label
    async fn update_label(&self, label: &Label, values: &UpdateLabelValues) -> Result<Label>;

    /// Delete a label
    async fn delete_label(&self, label: &Label) -> Result<()>;

    /// Register a creative/destructive action on the audit trail
    async fn register_audit_trail(
        &self,
        user: &User,
        entry: &AuditEntry,
        ip_address: Option<&IpAddr>,
    ) -> Result<()>;
}
