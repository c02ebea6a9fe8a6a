use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub active: bool,
}

impl Comment {
    pub fn new(post_id: String, name: String, email: String, body: String) -> Self {
        let now = super::timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            post_id,
            name,
            email,
            body,
            created_at: now.clone(),
            updated_at: now,
            active: true,
        }
    }
}
