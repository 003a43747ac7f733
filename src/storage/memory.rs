//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

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
use super::Result;
use super::Storage;
use super::UpdateLabelValues;
use super::UpdateNoteValues;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<i64, User>>>,

    /// All notes in storage
    notes: Arc<Mutex<HashMap<i64, Note>>>,

    /// All labels in storage
    labels: Arc<Mutex<HashMap<i64, Label>>>,

    /// All collaborators in storage, keyed on note and user
    collaborators: Arc<Mutex<HashMap<(i64, i64), Collaborator>>>,

    /// Source of fresh IDs, shared by all entities
    next_id: Arc<Mutex<i64>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            notes: Arc::new(Mutex::new(HashMap::new())),
            labels: Arc::new(Mutex::new(HashMap::new())),
            collaborators: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Hand out a fresh ID
    async fn fresh_id(&self) -> i64 {
        let mut next_id = self.next_id.lock().await;
        let id = *next_id;
        *next_id += 1;

        id
    }
}

#[async_trait]
impl Storage for Memory {
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_single_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn create_user(&self, values: &CreateUserValues) -> Result<User> {
        let user = User {
            id: self.fresh_id().await,
            session_id: *values.session_id,
            username: values.username.to_string(),
            email: values.email.to_string(),
            hashed_password: values.hashed_password.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.users.lock().await.insert(user.id, user.clone());

        Ok(user)
    }

    async fn change_password(&self, user: &User, values: &ChangePasswordValues) -> Result<User> {
        Ok(self
            .users
            .lock()
            .await
            .get_mut(&user.id)
            .map(|user| {
                user.session_id = *values.session_id;
                user.hashed_password = values.hashed_password.to_string();

                user.clone()
            })
            .expect("HashMap is the source of the user"))
    }

    async fn find_single_note_by_id(&self, owner: &User, note_id: i64) -> Result<Option<Note>> {
        Ok(self
            .notes
            .lock()
            .await
            .get(&note_id)
            .filter(|note| note.is_owned_by(owner))
            .cloned())
    }

    async fn find_single_note_by_id_unchecked(&self, note_id: i64) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get(&note_id).cloned())
    }

    async fn find_all_notes_by_owner_or_collaborator(&self, user: &User) -> Result<Vec<Note>> {
        let shared_note_ids = self
            .collaborators
            .lock()
            .await
            .keys()
            .filter(|(_, user_id)| *user_id == user.id)
            .map(|(note_id, _)| *note_id)
            .collect::<Vec<i64>>();

        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| note.is_owned_by(user) || shared_note_ids.contains(&note.id))
            .filter(|note| !note.is_archived && !note.is_trashed)
            .cloned()
            .collect::<Vec<Note>>();

        notes.sort_by_key(|note| note.id);

        Ok(notes)
    }

    async fn find_all_notes_by_owner_filtered(
        &self,
        owner: &User,
        is_archived: Option<bool>,
        is_trashed: Option<bool>,
    ) -> Result<Vec<Note>> {
        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| note.is_owned_by(owner))
            .filter(|note| is_archived.is_none_or(|is_archived| note.is_archived == is_archived))
            .filter(|note| is_trashed.is_none_or(|is_trashed| note.is_trashed == is_trashed))
            .cloned()
            .collect::<Vec<Note>>();

        notes.sort_by_key(|note| note.id);

        Ok(notes)
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let note = Note {
            id: self.fresh_id().await,
            user_id: values.user.id,
            title: values.title.to_string(),
            description: values.description.to_string(),
            color: values.color.to_string(),
            reminder: values.reminder.copied(),
            is_archived: false,
            is_trashed: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.notes.lock().await.insert(note.id, note.clone());

        Ok(note)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues) -> Result<Note> {
        Ok(self
            .notes
            .lock()
            .await
            .get_mut(&note.id)
            .map(|note| {
                if let Some(title) = values.title {
                    note.title = title.to_string();
                }

                if let Some(description) = values.description {
                    note.description = description.to_string();
                }

                if let Some(color) = values.color {
                    note.color = color.to_string();
                }

                if let Some(reminder) = values.reminder {
                    note.reminder = Some(*reminder);
                }

                note.clone()
            })
            .expect("HashMap is the source of the note"))
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        self.notes.lock().await.remove(&note.id);

        self.collaborators
            .lock()
            .await
            .retain(|(note_id, _), _| *note_id != note.id);

        Ok(())
    }

    async fn set_note_flag(&self, note: &Note, flag: NoteFlag, value: bool) -> Result<Note> {
        Ok(self
            .notes
            .lock()
            .await
            .get_mut(&note.id)
            .map(|note| {
                match flag {
                    NoteFlag::Archive => note.is_archived = value,
                    NoteFlag::Trash => note.is_trashed = value,
                }

                note.clone()
            })
            .expect("HashMap is the source of the note"))
    }

    async fn find_single_collaborator(
        &self,
        note_id: i64,
        user_id: i64,
    ) -> Result<Option<Collaborator>> {
        Ok(self
            .collaborators
            .lock()
            .await
            .get(&(note_id, user_id))
            .cloned())
    }

    async fn create_collaborator(&self, values: &CreateCollaboratorValues) -> Result<Collaborator> {
        let collaborator = Collaborator {
            note_id: values.note.id,
            user_id: values.user.id,
            access_type: values.access_type,
            created_at: Utc::now().naive_utc(),
        };

        self.collaborators
            .lock()
            .await
            .insert((collaborator.note_id, collaborator.user_id), collaborator.clone());

        Ok(collaborator)
    }

    async fn delete_collaborator(&self, note_id: i64, user_id: i64) -> Result<()> {
        self.collaborators.lock().await.remove(&(note_id, user_id));

        Ok(())
    }

    async fn find_all_labels_by_user(&self, user: &User) -> Result<Vec<Label>> {
        let mut labels = self
            .labels
            .lock()
            .await
            .values()
            .filter(|label| label.user_id == user.id)
            .cloned()
            .collect::<Vec<Label>>();

        labels.sort_by_key(|label| label.id);

        Ok(labels)
    }

    async fn find_single_label_by_id(&self, owner: &User, label_id: i64) -> Result<Option<Label>> {
        Ok(self
            .labels
            .lock()
            .await
            .get(&label_id)
            .filter(|label| label.user_id == owner.id)
            .cloned())
    }

    async fn create_label(&self, values: &CreateLabelValues) -> Result<Label> {
        let label = Label {
            id: self.fresh_id().await,
            user_id: values.user.id,
            name: values.name.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.labels.lock().await.insert(label.id, label.clone());

        Ok(label)
    }

    async fn update_label(&self, label: &Label, values: &UpdateLabelValues) -> Result<Label> {
        Ok(self
            .labels
            .lock()
            .await
            .get_mut(&label.id)
            .map(|label| {
                if let Some(name) = values.name {
                    label.name = name.to_string();
                }

                label.clone()
            })
            .expect("HashMap is the source of the label"))
    }

    async fn delete_label(&self, label: &Label) -> Result<()> {
        self.labels.lock().await.remove(&label.id);

        Ok(())
    }

    async fn register_audit_trail(
        &self,
        _user: &User,
        _entry: &AuditEntry,
        _ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        Ok(())
    }
}
