use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::labels::Label;
use crate::storage::AuditEntry;
use crate::storage::CreateLabelValues;
use crate::storage::Storage;
use crate::storage::UpdateLabelValues;
use crate::users::User;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LabelResponse {
    fn from_label(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }

    fn from_label_multiple(mut labels: Vec<Label>) -> Vec<Self> {
        labels
            .drain(..)
            .map(Self::from_label)
            .collect::<Vec<Self>>()
    }
}

pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<LabelResponse>>, Error> {
    let labels = storage
        .find_all_labels_by_user(&current_user)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(LabelResponse::from_label_multiple(labels)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelForm {
    name: String,
}

pub async fn create<S: Storage>(
    audit_trail: AuditTrail<S>,
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateLabelForm>,
) -> Result<Success<LabelResponse>, Error> {
    if form.name.is_empty() {
        return Err(Error::bad_request("Name is required"));
    }

    let values = CreateLabelValues {
        user: &current_user,
        name: &form.name,
    };

    let label = storage
        .create_label(&values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail.register(AuditEntry::CreateLabel(&label)).await;

    Ok(Success::created(LabelResponse::from_label(label)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelForm {
    name: Option<String>,
}

pub async fn update<S: Storage>(
    audit_trail: AuditTrail<S>,
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(label_id): PathParameters<i64>,
    Form(form): Form<UpdateLabelForm>,
) -> Result<Success<LabelResponse>, Error> {
    if form.name.as_ref().is_some_and(|name| name.is_empty()) {
        return Err(Error::bad_request("Name is required"));
    }

    let label = get_label(&storage, &current_user, label_id).await?;

    let values = UpdateLabelValues {
        name: form.name.as_ref(),
    };

    let label = storage
        .update_label(&label, &values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail.register(AuditEntry::UpdateLabel(&label)).await;

    Ok(Success::ok(LabelResponse::from_label(label)))
}

pub async fn delete<S: Storage>(
    audit_trail: AuditTrail<S>,
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(label_id): PathParameters<i64>,
) -> Result<Success<&'static str>, Error> {
    let label = get_label(&storage, &current_user, label_id).await?;

    storage
        .delete_label(&label)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail.register(AuditEntry::DeleteLabel(&label)).await;

    Ok(Success::<&'static str>::no_content())
}

async fn get_label<S: Storage>(storage: &S, owner: &User, label_id: i64) -> Result<Label, Error> {
    storage
        .find_single_label_by_id(owner, label_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Label not found")), Ok)
}
