use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::post,
    Form, Router,
};

use super::posts::{comment_view, CommentView};
use crate::error::AppError;
use crate::forms::{CommentForm, FormErrors};
use crate::models::Comment;
use crate::queries;
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/comment.html")]
struct CommentTemplate {
    post_title: String,
    post_url: String,
    post_id: String,
    comment: Option<CommentView>,
    form: CommentForm,
    errors: FormErrors,
    static_hash: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/posts/{id}/comment", post(post_comment))
}

async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = queries::find_published_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let (comment, form, errors) = match form.clean() {
        Ok(cleaned) => {
            let comment = Comment::new(post.id.clone(), cleaned.name, cleaned.email, cleaned.body);
            queries::insert_comment(&state.db, &comment).await?;
            tracing::info!(post_id = %post.id, comment_id = %comment.id, "comment added");
            (Some(comment_view(comment)), CommentForm::default(), FormErrors::new())
        }
        Err(errors) => (None, form, errors),
    };

    let template = CommentTemplate {
        post_url: post.absolute_url(),
        post_title: post.title,
        post_id: post.id,
        comment,
        form,
        errors,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}
