use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
    routing::get,
    Form, Router,
};

use crate::error::AppError;
use crate::forms::{EmailPostForm, FormErrors};
use crate::models::Post;
use crate::queries;
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/share.html")]
struct ShareTemplate {
    post_title: String,
    post_id: String,
    form: EmailPostForm,
    errors: FormErrors,
    sent: bool,
    failed: bool,
    static_hash: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/posts/{id}/share", get(share_form).post(share_submit))
}

async fn share_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = queries::find_published_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    render(post, EmailPostForm::default(), FormErrors::new(), false, false)
}

async fn share_submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<EmailPostForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = queries::find_published_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let cd = match form.clean() {
        Ok(cd) => cd,
        Err(errors) => return render(post, form, errors, false, false),
    };

    let post_url = absolute_url(&state, &headers, &post.absolute_url());
    let subject = share_subject(&cd, &post.title);
    let message = share_message(&cd, &post.title, &post_url);

    let sent = match state
        .mailer
        .send_mail(&subject, &message, std::slice::from_ref(&cd.to))
        .await
    {
        Ok(()) => {
            tracing::info!(post_id = %post.id, to = %cd.to, "post shared by email");
            true
        }
        Err(e) => {
            tracing::warn!(post_id = %post.id, "could not send share email: {e}");
            false
        }
    };

    render(post, cd, FormErrors::new(), sent, !sent)
}

fn render(post: Post, form: EmailPostForm, errors: FormErrors, sent: bool, failed: bool) -> Result<Html<String>, AppError> {
    let template = ShareTemplate {
        post_title: post.title,
        post_id: post.id,
        form,
        errors,
        sent,
        failed,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

/// Absolute form of `path`, rooted at the configured site URL or, failing
/// that, the host the request was sent to. Hosts outside `ALLOWED_HOSTS`
/// are replaced by `localhost`.
fn absolute_url(state: &AppState, headers: &HeaderMap, path: &str) -> String {
    if let Some(site) = &state.config.site_url {
        return format!("{site}{path}");
    }

    let host = match headers.get(header::HOST).map(|h| h.to_str()) {
        Some(Ok(host)) if state.config.is_allowed_host(host) => host,
        Some(_) => {
            tracing::warn!(host = ?headers.get(header::HOST), "Host header not in ALLOWED_HOSTS");
            "localhost"
        }
        None => "localhost",
    };
    format!("http://{host}{path}")
}

fn share_subject(cd: &EmailPostForm, title: &str) -> String {
    format!("{} ({}) recommends you read {}", cd.name, cd.email, title)
}

fn share_message(cd: &EmailPostForm, title: &str, post_url: &str) -> String {
    format!("Read {title} at {post_url}\n\n{}'s comment: {}", cd.name, cd.comment)
}
