#![allow(dead_code)]

use axum::body::Body;
use http_body_util::BodyExt;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use blog::config::Config;
use blog::mail::{Mailer, OutgoingMail, Outbox};
use blog::AppState;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub outbox: Outbox,
    pub author_id: String,
}

/// A post to insert directly into the database.
pub struct PostFixture<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub publish: &'a str,
    pub published: bool,
    pub tags: &'a [&'a str],
}

impl<'a> PostFixture<'a> {
    pub fn published(title: &'a str, slug: &'a str, publish: &'a str) -> Self {
        Self {
            title,
            slug,
            publish,
            published: true,
            tags: &[],
        }
    }

    pub fn draft(title: &'a str, slug: &'a str, publish: &'a str) -> Self {
        Self {
            published: false,
            ..Self::published(title, slug, publish)
        }
    }

    pub fn tagged(self, tags: &'a [&'a str]) -> Self {
        Self { tags, ..self }
    }
}

pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

impl TestApp {
    pub async fn new() -> Self {
        let (mailer, outbox) = Mailer::memory("webmaster@localhost");
        Self::with_mailer(mailer, outbox).await
    }

    pub async fn with_mailer(mailer: Mailer, outbox: Outbox) -> Self {
        let pool = memory_pool().await;
        let config = Config {
            allowed_hosts: vec!["blog.test".to_string()],
            ..Config::default()
        };
        let router = blog::build_app(AppState::new(pool.clone(), config, mailer));

        let author_id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO authors (id, username, created_at) VALUES (?, ?, ?)")
            .bind(&author_id)
            .bind("admin")
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .expect("Failed to create test author");

        Self {
            router,
            db: pool,
            outbox,
            author_id,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Insert a post with its tags and return its id.
    pub async fn create_post(&self, fixture: PostFixture<'_>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let status = if fixture.published { "PB" } else { "DF" };

        sqlx::query(
            "INSERT INTO posts (id, title, slug, author_id, body, publish, created_at, updated_at, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(fixture.title)
        .bind(fixture.slug)
        .bind(&self.author_id)
        .bind(format!("Body of {}.", fixture.title))
        .bind(fixture.publish)
        .bind(&now)
        .bind(&now)
        .bind(status)
        .execute(&self.db)
        .await
        .expect("Failed to create test post");

        for &tag in fixture.tags {
            sqlx::query("INSERT OR IGNORE INTO tags (id, name, slug, created_at) VALUES (?, ?, ?, ?)")
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(tag)
                .bind(tag)
                .bind(&now)
                .execute(&self.db)
                .await
                .unwrap();
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT ?, id FROM tags WHERE slug = ?")
                .bind(&id)
                .bind(tag)
                .execute(&self.db)
                .await
                .unwrap();
        }

        id
    }

    /// Insert a comment directly and return its id.
    pub async fn create_comment(&self, post_id: &str, name: &str, body: &str, active: bool) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO comments (id, post_id, name, email, body, created_at, updated_at, active) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(post_id)
        .bind(name)
        .bind("reader@example.com")
        .bind(body)
        .bind(&now)
        .bind(&now)
        .bind(active)
        .execute(&self.db)
        .await
        .expect("Failed to create test comment");
        id
    }

    pub async fn comment_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.db)
            .await
            .unwrap();
        count
    }

    pub fn sent_mail(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().unwrap().clone()
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request.
    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        self.post_form_with_host(uri, "blog.test", body).await
    }

    /// Send a POST form request with the given `Host` header.
    pub async fn post_form_with_host(&self, uri: &str, host: &str, body: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("POST")
            .header("host", host)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// GET `uri`, assert 200 and return the body.
pub async fn get_ok(app: &TestApp, uri: &str) -> String {
    let resp = app.get(uri).await;
    assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
    body_string(resp).await
}
