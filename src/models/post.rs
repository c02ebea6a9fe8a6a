use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum PostStatus {
    #[default]
    #[serde(rename = "draft")]
    #[sqlx(rename = "DF")]
    Draft,
    #[serde(rename = "published")]
    #[sqlx(rename = "PB")]
    Published,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "Draft"),
            PostStatus::Published => write!(f, "Published"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub author_id: String,
    pub body: String,
    pub publish: String,
    pub created_at: String,
    pub updated_at: String,
    pub status: PostStatus,
}

/// Post joined with its author's username, as the public pages show it.
#[derive(Debug, Clone, FromRow)]
pub struct PostWithAuthor {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: String,
}

impl Post {
    pub fn new(author_id: String, title: String, slug: String, body: String, publish: String) -> Self {
        let now = super::timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            slug,
            author_id,
            body,
            publish,
            created_at: now.clone(),
            updated_at: now,
            status: PostStatus::Draft,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Calendar date of `publish`, the scope of slug uniqueness.
    pub fn publish_date(&self) -> NaiveDate {
        self.publish
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_default()
    }

    /// Path of the detail page: `/{year}/{month}/{day}/{slug}`.
    pub fn absolute_url(&self) -> String {
        let date = self.publish_date();
        format!("/{}/{}/{}/{}", date.year(), date.month(), date.day(), self.slug)
    }

    /// Human-readable publish date, e.g. "Jan 5, 2024".
    pub fn publish_display(&self) -> String {
        self.publish_date().format("%b %-d, %Y").to_string()
    }
}
