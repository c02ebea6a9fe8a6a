use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{post_views, PostView, TagView};
use crate::error::AppError;
use crate::forms::{CommentForm, FormErrors};
use crate::markdown;
use crate::models::Tag;
use crate::pagination::{Page, Paginator};
use crate::queries;
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/list.html")]
struct PostListTemplate {
    posts: Vec<PostView>,
    tag: Option<TagView>,
    page: Page,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "posts/detail.html")]
struct PostDetailTemplate {
    post: PostDetailView,
    comments: Vec<CommentView>,
    similar_posts: Vec<SimilarPostView>,
    post_id: String,
    form: CommentForm,
    errors: FormErrors,
    static_hash: &'static str,
}

struct PostDetailView {
    title: String,
    author: String,
    publish: String,
    body_html: String,
    reading_time: usize,
    share_url: String,
    tags: Vec<TagView>,
}

pub struct CommentView {
    pub name: String,
    pub body: String,
    pub created: String,
}

struct SimilarPostView {
    title: String,
    url: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    page: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(post_list))
        .route("/tag/{tag_slug}", get(post_list_by_tag))
        .route("/{year}/{month}/{day}/{slug}", get(post_detail))
}

async fn post_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    render_list(&state, None, params.page.as_deref()).await
}

async fn post_list_by_tag(
    State(state): State<AppState>,
    Path(tag_slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let tag = queries::find_tag_by_slug(&state.db, &tag_slug)
        .await?
        .ok_or(AppError::NotFound)?;

    render_list(&state, Some(tag), params.page.as_deref()).await
}

async fn render_list(state: &AppState, tag: Option<Tag>, page: Option<&str>) -> Result<Html<String>, AppError> {
    let tag_id = tag.as_ref().map(|t| t.id.as_str());

    let count = queries::count_published(&state.db, tag_id).await?;
    let page = Paginator::new(count as usize, state.config.blog.posts_per_page).page(page);

    let posts = queries::published_posts(&state.db, tag_id, page.limit() as i64, page.offset() as i64).await?;

    let template = PostListTemplate {
        posts: post_views(&state.db, posts).await?,
        tag: tag.map(TagView::from),
        page,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

fn parse_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

async fn post_detail(
    State(state): State<AppState>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&year, &month, &day).ok_or(AppError::NotFound)?;

    let found = queries::find_published_by_date_slug(&state.db, date, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    let post = found.post;

    let comments = queries::active_comments(&state.db, &post.id).await?;
    let tags = queries::tags_for_post(&state.db, &post.id).await?;
    let similar = queries::similar_posts(&state.db, &post.id, state.config.blog.similar_posts_limit as i64).await?;

    let template = PostDetailTemplate {
        post: PostDetailView {
            title: post.title.clone(),
            author: found.author_name,
            publish: post.publish_display(),
            body_html: markdown::render(&post.body),
            reading_time: markdown::reading_time(&post.body),
            share_url: format!("/posts/{}/share", post.id),
            tags: tags.into_iter().map(TagView::from).collect(),
        },
        comments: comments.into_iter().map(comment_view).collect(),
        similar_posts: similar
            .into_iter()
            .map(|s| SimilarPostView {
                url: s.post.absolute_url(),
                title: s.post.title,
            })
            .collect(),
        post_id: post.id,
        form: CommentForm::default(),
        errors: FormErrors::new(),
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

pub(crate) fn comment_view(comment: crate::models::Comment) -> CommentView {
    let created = chrono::DateTime::parse_from_rfc3339(&comment.created_at)
        .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or(comment.created_at);

    CommentView {
        name: comment.name,
        body: comment.body,
        created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("2024", "1", "5"), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_date("2024", "02", "30"), None);
        assert_eq!(parse_date("year", "1", "5"), None);
    }
}
