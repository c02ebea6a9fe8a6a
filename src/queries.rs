//! Read queries over published content, plus comment insertion.
//!
//! Every public listing goes through [`PostStatus::Published`]; drafts are
//! only reachable from the command line.

use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};

use crate::models::{Comment, Post, PostStatus, PostWithAuthor, Tag};
use crate::trigram;

/// Candidate in the similar-posts ranking.
#[derive(Debug, Clone, FromRow)]
pub struct SimilarPost {
    #[sqlx(flatten)]
    pub post: Post,
    pub same_tags: i64,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub post: PostWithAuthor,
    pub similarity: f64,
}

pub async fn count_published(db: &SqlitePool, tag_id: Option<&str>) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM posts p
        WHERE p.status = ?
          AND (? IS NULL OR p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ?))
        "#,
    )
    .bind(PostStatus::Published)
    .bind(tag_id)
    .bind(tag_id)
    .fetch_one(db)
    .await?;

    Ok(count)
}

/// Published posts, newest first, optionally restricted to one tag.
pub async fn published_posts(
    db: &SqlitePool,
    tag_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.*, a.username AS author_name
        FROM posts p
        JOIN authors a ON a.id = p.author_id
        WHERE p.status = ?
          AND (? IS NULL OR p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ?))
        ORDER BY p.publish DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PostStatus::Published)
    .bind(tag_id)
    .bind(tag_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn find_tag_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(db)
        .await
}

pub async fn find_published_by_date_slug(
    db: &SqlitePool,
    date: NaiveDate,
    slug: &str,
) -> Result<Option<PostWithAuthor>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.*, a.username AS author_name
        FROM posts p
        JOIN authors a ON a.id = p.author_id
        WHERE p.status = ? AND p.slug = ? AND substr(p.publish, 1, 10) = ?
        "#,
    )
    .bind(PostStatus::Published)
    .bind(slug)
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_optional(db)
    .await
}

pub async fn find_published_by_id(db: &SqlitePool, id: &str) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ? AND status = ?")
        .bind(id)
        .bind(PostStatus::Published)
        .fetch_optional(db)
        .await
}

pub async fn tags_for_post(db: &SqlitePool, post_id: &str) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT t.* FROM tags t
        JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(db)
    .await
}

/// Other published posts sharing tags with `post_id`, most shared tags
/// first, then newest first.
pub async fn similar_posts(db: &SqlitePool, post_id: &str, limit: i64) -> Result<Vec<SimilarPost>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.*, COUNT(pt.tag_id) AS same_tags
        FROM posts p
        JOIN post_tags pt ON pt.post_id = p.id
        WHERE p.status = ?
          AND p.id != ?
          AND pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
        GROUP BY p.id
        ORDER BY same_tags DESC, p.publish DESC
        LIMIT ?
        "#,
    )
    .bind(PostStatus::Published)
    .bind(post_id)
    .bind(post_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Published posts whose title scores at least `threshold` against `query`,
/// best match first. Equal scores keep newest first.
pub async fn search_published(
    db: &SqlitePool,
    query: &str,
    threshold: f64,
) -> Result<Vec<SearchResult>, sqlx::Error> {
    let posts = published_posts(db, None, -1, 0).await?;

    let mut results: Vec<SearchResult> = posts
        .into_iter()
        .filter_map(|post| {
            let similarity = trigram::similarity(&post.post.title, query);
            (similarity >= threshold).then_some(SearchResult { post, similarity })
        })
        .collect();
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    Ok(results)
}

pub async fn active_comments(db: &SqlitePool, post_id: &str) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM comments WHERE post_id = ? AND active = 1 ORDER BY created_at ASC")
        .bind(post_id)
        .fetch_all(db)
        .await
}

pub async fn insert_comment(db: &SqlitePool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, name, email, body, created_at, updated_at, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.post_id)
    .bind(&comment.name)
    .bind(&comment.email)
    .bind(&comment.body)
    .bind(&comment.created_at)
    .bind(&comment.updated_at)
    .bind(comment.active)
    .execute(db)
    .await?;

    Ok(())
}
