//! Notes API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::cache::Cache;
use crate::notes::Note;
use crate::notes::NoteService;
use crate::notes::ReadSource;
use crate::notes::SourcedNote;
use crate::storage::AuditEntry;
use crate::storage::CreateNoteValues;
use crate::storage::Storage;
use crate::storage::UpdateNoteValues;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The note response information
///
/// A subset of all the information, ready to be serialized for the outside world
///
/// The archive/trash flags are only known when the note was served from storage, a cache-served
/// note omits them
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// The note ID
    pub id: i64,

    /// The title
    pub title: String,

    /// The body
    pub description: String,

    /// The display color
    pub color: String,

    /// The reminder moment, if set
    pub reminder: Option<NaiveDateTime>,

    /// The ID of the owner
    pub user_id: i64,

    /// The archive flag, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,

    /// The trash flag, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_trashed: Option<bool>,

    /// Where this note was served from
    pub source: ReadSource,
}

impl NoteResponse {
    /// Create a note response from a read, wherever it was served from
    fn from_sourced_note(note: SourcedNote) -> Self {
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            color: note.color,
            reminder: note.reminder,
            user_id: note.user_id,
            is_archived: note.flags.map(|flags| flags.is_archived),
            is_trashed: note.flags.map(|flags| flags.is_trashed),
            source: note.source,
        }
    }

    /// Create a note response from a stored note
    fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            color: note.color,
            reminder: note.reminder,
            user_id: note.user_id,
            is_archived: Some(note.is_archived),
            is_trashed: Some(note.is_trashed),
            source: ReadSource::Store,
        }
    }

    /// Create note responses from multiple reads
    fn from_sourced_note_multiple(mut notes: Vec<SourcedNote>) -> Vec<Self> {
        notes
            .drain(..)
            .map(Self::from_sourced_note)
            .collect::<Vec<Self>>()
    }

    /// Create note responses from multiple stored notes
    fn from_note_multiple(mut notes: Vec<Note>) -> Vec<Self> {
        notes.drain(..).map(Self::from_note).collect::<Vec<Self>>()
    }
}

/// List all notes of the current user
///
/// Owned and shared notes, served from the note cache when it has them
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 1, "title": "Groceries", "source": "cache" ... } ] }
/// ```
pub async fn list<S: Storage, C: Cache>(
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = note_service.list_notes(&current_user).await?;

    Ok(Success::ok(NoteResponse::from_sourced_note_multiple(notes)))
}

/// Get a single note
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/1
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": 1, "title": "Groceries", "source": "cache" ... } }
/// ```
pub async fn single<S: Storage, C: Cache>(
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<NoteResponse>, Error> {
    let note = note_service.get_note(&current_user, note_id).await?;

    Ok(Success::ok(NoteResponse::from_sourced_note(note)))
}

/// Create note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    /// Title of the note
    title: String,
    /// Body of the note
    description: String,
    /// Display color of the note
    color: String,
    /// Optional reminder moment
    reminder: Option<NaiveDateTime>,
}

/// Create a note based on the [`CreateNoteForm`](CreateNoteForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries", "description": "Apples", "color": "Green" }' \
///     http://localhost:6000/api/notes
/// ```
///
/// Response
/// ```json
/// { "data": { "id": 1, "title": "Groceries", "source": "store" ... } }
/// ```
pub async fn create<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let values = CreateNoteValues {
        user: &current_user,
        title: &form.title,
        description: &form.description,
        color: &form.color,
        reminder: form.reminder.as_ref(),
    };

    let note = note_service.create_note(&values).await?;

    audit_trail.register(AuditEntry::CreateNote(&note)).await;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Update note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    /// New (optional) title of the note
    title: Option<String>,
    /// New (optional) body of the note
    description: Option<String>,
    /// New (optional) display color of the note
    color: Option<String>,
    /// New (optional) reminder moment
    reminder: Option<NaiveDateTime>,
}

/// Update a note based on the [`UpdateNoteForm`](UpdateNoteForm) form
///
/// Absent fields keep their stored value
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "color": "Blue" }' \
///     http://localhost:6000/api/notes/1
/// ```
///
/// Response
/// ```json
/// { "data": { "id": 1, "color": "Blue", "source": "store" ... } }
/// ```
pub async fn update<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
    Form(form): Form<UpdateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let values = UpdateNoteValues {
        title: form.title.as_ref(),
        description: form.description.as_ref(),
        color: form.color.as_ref(),
        reminder: form.reminder.as_ref(),
    };

    let note = note_service
        .update_note(&current_user, note_id, &values)
        .await?;

    audit_trail.register(AuditEntry::UpdateNote(&note)).await;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Delete a note
///
/// The cached copy goes before the stored one
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/1
/// ```
pub async fn delete<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<&'static str>, Error> {
    let note = note_service.delete_note(&current_user, note_id).await?;

    audit_trail.register(AuditEntry::DeleteNote(&note)).await;

    Ok(Success::<&'static str>::no_content())
}

/// List all archived notes of the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/archived
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 1, "isArchived": true, "source": "store" ... } ] }
/// ```
pub async fn list_archived<S: Storage, C: Cache>(
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = note_service.list_archived(&current_user).await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// List all trashed notes of the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/trashed
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 1, "isTrashed": true, "source": "store" ... } ] }
/// ```
pub async fn list_trashed<S: Storage, C: Cache>(
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = note_service.list_trashed(&current_user).await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// The toggle response information
///
/// The updated note, with a human readable message about what happened
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// What happened to the note
    message: &'static str,

    /// The updated note
    note: NoteResponse,
}

/// Flip the archive flag of a note
///
/// Request:
/// ```sh
/// curl -v -XPATCH \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/1/archive
/// ```
///
/// Response
/// ```json
/// { "data": { "message": "Note moved to archive", "note": { "id": 1 ... } } }
/// ```
pub async fn toggle_archive<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<ToggleResponse>, Error> {
    let note = note_service.toggle_archive(&current_user, note_id).await?;

    audit_trail.register(AuditEntry::ArchiveNote(&note)).await;

    let message = if note.is_archived {
        "Note moved to archive"
    } else {
        "Note moved out of archive"
    };

    Ok(Success::ok(ToggleResponse {
        message,
        note: NoteResponse::from_note(note),
    }))
}

/// Flip the trash flag of a note
///
/// Request:
/// ```sh
/// curl -v -XPATCH \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/1/trash
/// ```
///
/// Response
/// ```json
/// { "data": { "message": "Note moved to trash", "note": { "id": 1 ... } } }
/// ```
pub async fn toggle_trash<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<ToggleResponse>, Error> {
    let note = note_service.toggle_trash(&current_user, note_id).await?;

    audit_trail.register(AuditEntry::TrashNote(&note)).await;

    let message = if note.is_trashed {
        "Note moved to trash"
    } else {
        "Note moved out of trash"
    };

    Ok(Success::ok(ToggleResponse {
        message,
        note: NoteResponse::from_note(note),
    }))
}
