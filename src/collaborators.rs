use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

/// The level of access granted to a collaborator
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Can see the note
    ReadOnly,

    /// Can see the note, recorded for clients that edit through other means
    ReadWrite,
}

#[derive(Clone, Debug)]
pub struct Collaborator {
    pub note_id: i64,
    pub user_id: i64,
    pub access_type: AccessType,
    pub created_at: NaiveDateTime,
}
