use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl Author {
    pub fn new(username: String, email: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email,
            created_at: super::timestamp(),
        }
    }
}
