use chrono::naive::NaiveDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub session_id: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
