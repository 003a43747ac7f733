use chrono::naive::NaiveDateTime;

#[derive(Clone, Debug)]
pub struct Label {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
