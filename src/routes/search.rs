use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use super::{post_views, PostView};
use crate::error::AppError;
use crate::forms::{FormErrors, SearchForm};
use crate::queries;
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/search.html")]
struct SearchTemplate {
    query: Option<String>,
    results: Vec<PostView>,
    errors: FormErrors,
    static_hash: &'static str,
}

impl SearchTemplate {
    fn found(&self) -> String {
        match self.results.len() {
            1 => "Found 1 result".to_string(),
            n => format!("Found {n} results"),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(post_search))
}

async fn post_search(
    State(state): State<AppState>,
    Query(form): Query<SearchForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut query = None;
    let mut results = Vec::new();
    let mut errors = FormErrors::new();

    match form.clean() {
        Some(Ok(q)) => {
            let threshold = state.config.blog.search_similarity_threshold;
            let found = queries::search_published(&state.db, &q, threshold).await?;
            tracing::debug!(query = %q, hits = found.len(), "search");
            results = post_views(&state.db, found.into_iter().map(|r| r.post).collect()).await?;
            query = Some(q);
        }
        Some(Err(e)) => errors = e,
        None => {}
    }

    let template = SearchTemplate {
        query,
        results,
        errors,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}
