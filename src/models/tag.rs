use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug::slugify(&name),
            name,
            created_at: super::timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tag_normalizes_name_and_slug() {
        let tag = Tag::new("  Web Dev ");
        assert_eq!(tag.name, "web dev");
        assert_eq!(tag.slug, "web-dev");
    }
}
