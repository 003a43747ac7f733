//! Collaborators API management

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::cache::Cache;
use crate::collaborators::AccessType;
use crate::collaborators::Collaborator;
use crate::notes::NoteService;
use crate::storage::AuditEntry;
use crate::storage::Storage;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The collaborator response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorResponse {
    /// The note the access applies to
    pub note: i64,

    /// The user the access was granted to
    pub collaborator: i64,

    /// The kind of access
    pub access_type: AccessType,
}

impl CollaboratorResponse {
    fn from_collaborator(collaborator: Collaborator) -> Self {
        Self {
            note: collaborator.note_id,
            collaborator: collaborator.user_id,
            access_type: collaborator.access_type,
        }
    }
}

/// Create collaborator form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollaboratorForm {
    /// The ID of the user to share the note with
    collaborator: i64,

    /// The kind of access to grant
    access_type: AccessType,
}

/// Share a note with another user
///
/// Only the owner of a note can share it
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "collaborator": 2, "accessType": "read_only" }' \
///     http://localhost:6000/api/notes/1/collaborators
/// ```
///
/// Response:
/// ```json
/// { "data": { "note": 1, "collaborator": 2, "accessType": "read_only" } }
/// ```
pub async fn create<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i64>,
    Form(form): Form<CreateCollaboratorForm>,
) -> Result<Success<CollaboratorResponse>, Error> {
    let collaborator = note_service
        .grant_access(&current_user, note_id, form.collaborator, form.access_type)
        .await?;

    audit_trail
        .register(AuditEntry::CreateCollaborator(&collaborator))
        .await;

    Ok(Success::created(CollaboratorResponse::from_collaborator(
        collaborator,
    )))
}

/// Stop sharing a note with a user
///
/// Revoking access a user does not have is a no-op
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/1/collaborators/2
/// ```
pub async fn delete<S: Storage, C: Cache>(
    audit_trail: AuditTrail<S>,
    Extension(note_service): Extension<NoteService<S, C>>,
    current_user: CurrentUser<S>,
    PathParameters((note_id, user_id)): PathParameters<(i64, i64)>,
) -> Result<Success<&'static str>, Error> {
    let note = note_service
        .revoke_access(&current_user, note_id, user_id)
        .await?;

    audit_trail
        .register(AuditEntry::DeleteCollaborator(&note, user_id))
        .await;

    Ok(Success::<&'static str>::no_content())
}
