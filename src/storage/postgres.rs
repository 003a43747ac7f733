//! Postgres storage

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::ipnetwork::IpNetwork;
use uuid::Uuid;

use crate::collaborators::AccessType;
use crate::collaborators::Collaborator;
use crate::labels::Label;
use crate::notes::Note;
use crate::notes::NoteFlag;
use crate::users::User;

use super::AuditEntry;
use super::ChangePasswordValues;
use super::CreateCollaboratorValues;
use super::CreateLabelValues;
use super::CreateNoteValues;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UpdateLabelValues;
use super::UpdateNoteValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres type for collaborator access
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "collaborator_access_type")]
#[sqlx(rename_all = "snake_case")]
enum CollaboratorAccessType {
    /// Can see the note
    ReadOnly,

    /// Can see the note and is recorded as an editor
    ReadWrite,
}

impl CollaboratorAccessType {
    /// Create collaborator access type from access type
    fn from_access_type(access_type: AccessType) -> Self {
        match access_type {
            AccessType::ReadOnly => Self::ReadOnly,
            AccessType::ReadWrite => Self::ReadWrite,
        }
    }

    /// Create access type from collaborator access type
    fn to_access_type(&self) -> AccessType {
        match self {
            Self::ReadOnly => AccessType::ReadOnly,
            Self::ReadWrite => AccessType::ReadWrite,
        }
    }
}

/// Postgres type for audit trail entry type
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "audit_trail_entry_type")]
#[sqlx(rename_all = "kebab-case")]
enum AuditEntryType {
    /// User is created
    CreateUser,

    /// User has changed password
    ChangePassword,

    /// Note is created
    CreateNote,

    /// Note is updated
    UpdateNote,

    /// Note is deleted
    DeleteNote,

    /// Note archive flag is flipped
    ArchiveNote,

    /// Note trash flag is flipped
    TrashNote,

    /// Label is created
    CreateLabel,

    /// Label is updated
    UpdateLabel,

    /// Label is deleted
    DeleteLabel,

    /// Note is shared with a user
    CreateCollaborator,

    /// Access of a user to a note is revoked
    DeleteCollaborator,
}

impl AuditEntryType {
    /// Create audit entry type from audit entry
    fn from_audit_entry(entry: &AuditEntry) -> Self {
        match entry {
            AuditEntry::CreateUser(_) => Self::CreateUser,
            AuditEntry::ChangePassword(_) => Self::ChangePassword,

            AuditEntry::CreateNote(_) => Self::CreateNote,
            AuditEntry::UpdateNote(_) => Self::UpdateNote,
            AuditEntry::DeleteNote(_) => Self::DeleteNote,
            AuditEntry::ArchiveNote(_) => Self::ArchiveNote,
            AuditEntry::TrashNote(_) => Self::TrashNote,

            AuditEntry::CreateLabel(_) => Self::CreateLabel,
            AuditEntry::UpdateLabel(_) => Self::UpdateLabel,
            AuditEntry::DeleteLabel(_) => Self::DeleteLabel,

            AuditEntry::CreateCollaborator(_) => Self::CreateCollaborator,
            AuditEntry::DeleteCollaborator(_, _) => Self::DeleteCollaborator,
        }
    }
}

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Postgres version of user
#[derive(sqlx::FromRow)]
struct PostgresUser {
    /// User ID
    id: i64,

    /// Session ID
    session_id: Uuid,

    /// Username
    username: String,

    /// Email address
    email: String,

    /// Hashed password
    hashed_password: String,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,
}

impl User {
    /// Create user from postgres version
    fn from_postgres_user(user: PostgresUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    /// Maybe create user from postgres version
    fn from_postgres_user_optional(user: Option<PostgresUser>) -> Option<Self> {
        user.map(Self::from_postgres_user)
    }
}

/// Postgres version of note
#[derive(sqlx::FromRow)]
struct PostgresNote {
    /// Note ID
    id: i64,

    /// Owner ID
    user_id: i64,

    /// Title
    title: String,

    /// Body
    description: String,

    /// Display color
    color: String,

    /// Reminder moment
    reminder: Option<NaiveDateTime>,

    /// Archive flag
    is_archived: bool,

    /// Trash flag
    is_trashed: bool,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,
}

impl Note {
    /// Create note from postgres version
    fn from_postgres_note(note: PostgresNote) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            description: note.description,
            color: note.color,
            reminder: note.reminder,
            is_archived: note.is_archived,
            is_trashed: note.is_trashed,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }

    /// Maybe create note from postgres version
    fn from_postgres_note_optional(note: Option<PostgresNote>) -> Option<Self> {
        note.map(Self::from_postgres_note)
    }

    /// Create multiple notes from postgres version
    fn from_postgres_note_multiple(mut notes: Vec<PostgresNote>) -> Vec<Self> {
        notes
            .drain(..)
            .map(Self::from_postgres_note)
            .collect::<Vec<Self>>()
    }
}

/// Postgres version of label
#[derive(sqlx::FromRow)]
struct PostgresLabel {
    /// Label ID
    id: i64,

    /// Owner ID
    user_id: i64,

    /// Name
    name: String,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,
}

impl Label {
    /// Create label from postgres version
    fn from_postgres_label(label: PostgresLabel) -> Self {
        Self {
            id: label.id,
            user_id: label.user_id,
            name: label.name,
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }

    /// Maybe create label from postgres version
    fn from_postgres_label_optional(label: Option<PostgresLabel>) -> Option<Self> {
        label.map(Self::from_postgres_label)
    }

    /// Create multiple labels from postgres version
    fn from_postgres_label_multiple(mut labels: Vec<PostgresLabel>) -> Vec<Self> {
        labels
            .drain(..)
            .map(Self::from_postgres_label)
            .collect::<Vec<Self>>()
    }
}

/// Postgres version of collaborator
#[derive(sqlx::FromRow)]
struct PostgresCollaborator {
    /// Note ID
    note_id: i64,

    /// User ID
    user_id: i64,

    /// Level of access
    access_type: CollaboratorAccessType,

    /// Creation date
    created_at: NaiveDateTime,
}

impl Collaborator {
    /// Create collaborator from postgres version
    fn from_postgres_collaborator(collaborator: PostgresCollaborator) -> Self {
        Self {
            note_id: collaborator.note_id,
            user_id: collaborator.user_id,
            access_type: collaborator.access_type.to_access_type(),
            created_at: collaborator.created_at,
        }
    }

    /// Maybe create collaborator from postgres version
    fn from_postgres_collaborator_optional(
        collaborator: Option<PostgresCollaborator>,
    ) -> Option<Self> {
        collaborator.map(Self::from_postgres_collaborator)
    }
}

#[async_trait]
impl Storage for Postgres {
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, PostgresUser>(
            r#"
            SELECT *
            FROM users
            WHERE username = $1
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_postgres_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, PostgresUser>(
            r#"
            SELECT *
            FROM users
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_postgres_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn create_user(&self, values: &CreateUserValues) -> Result<User> {
        let user = sqlx::query_as::<_, PostgresUser>(
            r#"
            INSERT INTO users (session_id, username, email, hashed_password)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.email)
        .bind(values.hashed_password)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_postgres_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn change_password(&self, user: &User, values: &ChangePasswordValues) -> Result<User> {
        let user = sqlx::query_as::<_, PostgresUser>(
            r#"
            UPDATE users
            SET session_id = $1, hashed_password = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(values.session_id)
        .bind(values.hashed_password)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_postgres_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_note_by_id(&self, owner: &User, note_id: i64) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, PostgresNote>(
            r#"
            SELECT *
            FROM notes
            WHERE id = $1 AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(note_id)
        .bind(owner.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_optional)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_single_note_by_id_unchecked(&self, note_id: i64) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, PostgresNote>(
            r#"
            SELECT *
            FROM notes
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_optional)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_all_notes_by_owner_or_collaborator(&self, user: &User) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, PostgresNote>(
            r#"
            SELECT *
            FROM notes
            WHERE (
                user_id = $1
                OR id IN (SELECT note_id FROM collaborators WHERE user_id = $1)
            )
                AND is_archived = FALSE
                AND is_trashed = FALSE
            ORDER BY id
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn find_all_notes_by_owner_filtered(
        &self,
        owner: &User,
        is_archived: Option<bool>,
        is_trashed: Option<bool>,
    ) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, PostgresNote>(
            r#"
            SELECT *
            FROM notes
            WHERE user_id = $1
                AND ($2::BOOLEAN IS NULL OR is_archived = $2)
                AND ($3::BOOLEAN IS NULL OR is_trashed = $3)
            ORDER BY id
            "#,
        )
        .bind(owner.id)
        .bind(is_archived)
        .bind(is_trashed)
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let note = sqlx::query_as::<_, PostgresNote>(
            r#"
            INSERT INTO notes (user_id, title, description, color, reminder)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(values.user.id)
        .bind(values.title)
        .bind(values.description)
        .bind(values.color)
        .bind(values.reminder)
        .fetch_one(&self.connection_pool)
        .await
        .map(Note::from_postgres_note)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues) -> Result<Note> {
        let updated_note = sqlx::query_as::<_, PostgresNote>(
            r#"
            UPDATE notes
            SET title = $1, description = $2, color = $3, reminder = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(values.title.unwrap_or(&note.title))
        .bind(values.description.unwrap_or(&note.description))
        .bind(values.color.unwrap_or(&note.color))
        .bind(values.reminder.copied().or(note.reminder))
        .bind(note.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Note::from_postgres_note)
        .map_err(connection_error)?;

        Ok(updated_note)
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM notes
            WHERE id = $1
            "#,
        )
        .bind(note.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn set_note_flag(&self, note: &Note, flag: NoteFlag, value: bool) -> Result<Note> {
        let query = match flag {
            NoteFlag::Archive => {
                r#"
                UPDATE notes
                SET is_archived = $1, updated_at = CURRENT_TIMESTAMP
                WHERE id = $2
                RETURNING *
                "#
            }
            NoteFlag::Trash => {
                r#"
                UPDATE notes
                SET is_trashed = $1, updated_at = CURRENT_TIMESTAMP
                WHERE id = $2
                RETURNING *
                "#
            }
        };

        let updated_note = sqlx::query_as::<_, PostgresNote>(query)
            .bind(value)
            .bind(note.id)
            .fetch_one(&self.connection_pool)
            .await
            .map(Note::from_postgres_note)
            .map_err(connection_error)?;

        Ok(updated_note)
    }

    async fn find_single_collaborator(
        &self,
        note_id: i64,
        user_id: i64,
    ) -> Result<Option<Collaborator>> {
        let collaborator = sqlx::query_as::<_, PostgresCollaborator>(
            r#"
            SELECT *
            FROM collaborators
            WHERE note_id = $1 AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Collaborator::from_postgres_collaborator_optional)
        .map_err(connection_error)?;

        Ok(collaborator)
    }

    async fn create_collaborator(&self, values: &CreateCollaboratorValues) -> Result<Collaborator> {
        let collaborator = sqlx::query_as::<_, PostgresCollaborator>(
            r#"
            INSERT INTO collaborators (note_id, user_id, access_type)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(values.note.id)
        .bind(values.user.id)
        .bind(CollaboratorAccessType::from_access_type(values.access_type))
        .fetch_one(&self.connection_pool)
        .await
        .map(Collaborator::from_postgres_collaborator)
        .map_err(connection_error)?;

        Ok(collaborator)
    }

    async fn delete_collaborator(&self, note_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM collaborators
            WHERE note_id = $1 AND user_id = $2
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn find_all_labels_by_user(&self, user: &User) -> Result<Vec<Label>> {
        let labels = sqlx::query_as::<_, PostgresLabel>(
            r#"
            SELECT *
            FROM labels
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.connection_pool)
        .await
        .map(Label::from_postgres_label_multiple)
        .map_err(connection_error)?;

        Ok(labels)
    }

    async fn find_single_label_by_id(&self, owner: &User, label_id: i64) -> Result<Option<Label>> {
        let label = sqlx::query_as::<_, PostgresLabel>(
            r#"
            SELECT *
            FROM labels
            WHERE id = $1 AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(label_id)
        .bind(owner.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Label::from_postgres_label_optional)
        .map_err(connection_error)?;

        Ok(label)
    }

    async fn create_label(&self, values: &CreateLabelValues) -> Result<Label> {
        let label = sqlx::query_as::<_, PostgresLabel>(
            r#"
            INSERT INTO labels (user_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(values.user.id)
        .bind(values.name)
        .fetch_one(&self.connection_pool)
        .await
        .map(Label::from_postgres_label)
        .map_err(connection_error)?;

        Ok(label)
    }

    async fn update_label(&self, label: &Label, values: &UpdateLabelValues) -> Result<Label> {
        let updated_label = sqlx::query_as::<_, PostgresLabel>(
            r#"
            UPDATE labels
            SET name = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(values.name.unwrap_or(&label.name))
        .bind(label.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Label::from_postgres_label)
        .map_err(connection_error)?;

        Ok(updated_label)
    }

    async fn delete_label(&self, label: &Label) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM labels
            WHERE id = $1
            "#,
        )
        .bind(label.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn register_audit_trail(
        &self,
        user: &User,
        entry: &AuditEntry,
        ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        let (user_id, note_id, label_id) = match entry {
            AuditEntry::CreateUser(user) | AuditEntry::ChangePassword(user) => {
                (Some(user.id), None, None)
            }

            AuditEntry::CreateNote(note)
            | AuditEntry::UpdateNote(note)
            | AuditEntry::DeleteNote(note)
            | AuditEntry::ArchiveNote(note)
            | AuditEntry::TrashNote(note) => (None, Some(note.id), None),

            AuditEntry::CreateLabel(label)
            | AuditEntry::UpdateLabel(label)
            | AuditEntry::DeleteLabel(label) => (None, None, Some(label.id)),

            AuditEntry::CreateCollaborator(collaborator) => {
                (Some(collaborator.user_id), Some(collaborator.note_id), None)
            }

            AuditEntry::DeleteCollaborator(note, user_id) => {
                (Some(*user_id), Some(note.id), None)
            }
        };

        sqlx::query(
            r#"
            INSERT INTO audit_trail (type, created_by, user_id, note_id, label_id, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(AuditEntryType::from_audit_entry(entry))
        .bind(user.id)
        .bind(user_id)
        .bind(note_id)
        .bind(label_id)
        .bind(
            ip_address
                .map(ToString::to_string)
                .and_then(|ip| ip.parse::<IpNetwork>().ok()),
        )
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
