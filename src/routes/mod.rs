pub mod comments;
pub mod posts;
pub mod search;
pub mod share;

use sqlx::SqlitePool;

use crate::markdown;
use crate::models::{PostWithAuthor, Tag};

/// Tag as linked from a post.
pub struct TagView {
    pub name: String,
    pub slug: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            name: tag.name,
            slug: tag.slug,
        }
    }
}

/// A post as it appears in lists and search results.
pub struct PostView {
    pub title: String,
    pub url: String,
    pub author: String,
    pub publish: String,
    pub excerpt: String,
    pub tags: Vec<TagView>,
}

async fn post_views(db: &SqlitePool, posts: Vec<PostWithAuthor>) -> Result<Vec<PostView>, sqlx::Error> {
    let mut views = Vec::with_capacity(posts.len());
    for PostWithAuthor { post, author_name } in posts {
        let tags = crate::queries::tags_for_post(db, &post.id).await?;
        views.push(PostView {
            url: post.absolute_url(),
            publish: post.publish_display(),
            excerpt: markdown::excerpt(&post.body),
            title: post.title,
            author: author_name,
            tags: tags.into_iter().map(TagView::from).collect(),
        });
    }
    Ok(views)
}
