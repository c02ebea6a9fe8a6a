use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::fs;

use crate::models::{timestamp, Author, Post, PostStatus, Tag};

/// Everything needed to write a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub author: String,
    pub title: String,
    pub body: String,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub publish_at: Option<String>,
    pub status: PostStatus,
}

#[derive(Deserialize)]
struct ImportedPost {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    body: String,
    #[serde(default, alias = "publishedAt")]
    publish: Option<String>,
    #[serde(default)]
    status: PostStatus,
    #[serde(default)]
    tags: Vec<String>,
}

/// Normalize an RFC 3339 timestamp to the storage format, or use now.
fn normalize_publish(publish: Option<&str>) -> Result<String> {
    match publish {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw.trim())
                .with_context(|| format!("invalid publish timestamp: {raw}"))?;
            Ok(parsed
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        None => Ok(timestamp()),
    }
}

pub async fn create_author(pool: &SqlitePool, username: &str, email: Option<&str>) -> Result<Author> {
    let author = Author::new(username.to_string(), email.map(str::to_string));
    if author.username.is_empty() {
        bail!("username must not be empty");
    }

    sqlx::query("INSERT INTO authors (id, username, email, created_at) VALUES (?, ?, ?, ?)")
        .bind(&author.id)
        .bind(&author.username)
        .bind(&author.email)
        .bind(&author.created_at)
        .execute(pool)
        .await
        .with_context(|| format!("could not create author '{}'", author.username))?;

    Ok(author)
}

async fn find_author_id(conn: &mut SqliteConnection, username: &str) -> Result<String> {
    let author: Option<(String,)> = sqlx::query_as("SELECT id FROM authors WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

    match author {
        Some((id,)) => Ok(id),
        None => bail!("Author '{username}' not found"),
    }
}

async fn insert_post(conn: &mut SqliteConnection, author_id: &str, new: NewPost) -> Result<Post> {
    let slug = new
        .slug
        .filter(|s| !s.trim().is_empty())
        .map(|s| slug::slugify(s.trim()))
        .unwrap_or_else(|| slug::slugify(&new.title));
    if new.title.trim().is_empty() || slug.is_empty() {
        bail!("post needs a title");
    }

    let publish = normalize_publish(new.publish_at.as_deref())?;
    let mut post = Post::new(author_id.to_string(), new.title.trim().to_string(), slug, new.body, publish);
    post.status = new.status;

    let (taken,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM posts WHERE slug = ? AND substr(publish, 1, 10) = ?")
            .bind(&post.slug)
            .bind(post.publish_date().format("%Y-%m-%d").to_string())
            .fetch_one(&mut *conn)
            .await?;
    if taken > 0 {
        bail!(
            "slug '{}' is already used by a post published on {}",
            post.slug,
            post.publish_date()
        );
    }

    sqlx::query(
        r#"
        INSERT INTO posts (id, title, slug, author_id, body, publish, created_at, updated_at, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.author_id)
    .bind(&post.body)
    .bind(&post.publish)
    .bind(&post.created_at)
    .bind(&post.updated_at)
    .bind(post.status)
    .execute(&mut *conn)
    .await?;

    attach_tags(conn, &post.id, &new.tags).await?;

    Ok(post)
}

/// Link `names` to the post, creating tags that do not exist yet.
pub async fn attach_tags(conn: &mut SqliteConnection, post_id: &str, names: &[String]) -> Result<()> {
    for name in names {
        let tag = Tag::new(name);
        if tag.name.is_empty() || tag.slug.is_empty() {
            continue;
        }

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ? OR slug = ?")
            .bind(&tag.name)
            .bind(&tag.slug)
            .fetch_optional(&mut *conn)
            .await?;

        let tag_id = match existing {
            Some((id,)) => id,
            None => {
                sqlx::query("INSERT INTO tags (id, name, slug, created_at) VALUES (?, ?, ?, ?)")
                    .bind(&tag.id)
                    .bind(&tag.name)
                    .bind(&tag.slug)
                    .bind(&tag.created_at)
                    .execute(&mut *conn)
                    .await?;
                tag.id
            }
        };

        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(&tag_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

pub async fn create_post(pool: &SqlitePool, new: NewPost) -> Result<Post> {
    let mut tx = pool.begin().await?;
    let author_id = find_author_id(&mut tx, &new.author).await?;
    let post = insert_post(&mut tx, &author_id, new).await?;
    tx.commit().await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, status = %post.status, "post created");
    Ok(post)
}

/// Import a JSON array of posts for one author. Either every post is
/// imported or none is.
pub async fn import_posts(pool: &SqlitePool, file_path: &str, author: &str) -> Result<usize> {
    let content = fs::read_to_string(file_path).with_context(|| format!("reading {file_path}"))?;
    let posts: Vec<ImportedPost> =
        serde_json::from_str(&content).with_context(|| format!("parsing {file_path}"))?;

    let mut tx = pool.begin().await?;
    let author_id = find_author_id(&mut tx, author).await?;

    let mut imported = 0;
    for post in posts {
        let title = post.title.clone();
        let new = NewPost {
            author: author.to_string(),
            title: post.title,
            body: post.body,
            slug: post.slug,
            tags: post.tags,
            publish_at: post.publish,
            status: post.status,
        };
        insert_post(&mut tx, &author_id, new)
            .await
            .with_context(|| format!("importing '{title}'"))?;
        imported += 1;
    }

    tx.commit().await?;
    Ok(imported)
}

pub async fn set_post_status(pool: &SqlitePool, post_id: &str, status: PostStatus) -> Result<()> {
    let result = sqlx::query("UPDATE posts SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(timestamp())
        .bind(post_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        bail!("Post '{post_id}' not found");
    }
    Ok(())
}

/// Show or hide a comment. Comments are never deleted.
pub async fn set_comment_active(pool: &SqlitePool, comment_id: &str, active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE comments SET active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(timestamp())
        .bind(comment_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        bail!("Comment '{comment_id}' not found");
    }
    Ok(())
}
