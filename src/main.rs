use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use blog::cli::{self, NewPost};
use blog::config::Config;
use blog::mail::Mailer;
use blog::models::PostStatus;
use blog::{build_app, db, AppState};

#[derive(Parser)]
#[command(name = "blog", version, about = "A small server-rendered blog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Create an author
    CreateAuthor {
        username: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a post from a Markdown file
    CreatePost {
        #[arg(long)]
        author: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body_file: String,
        #[arg(long)]
        slug: Option<String>,
        /// Comma-separated tag names
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// RFC 3339 publish timestamp, defaults to now
        #[arg(long)]
        publish_at: Option<String>,
        #[arg(long)]
        published: bool,
    },
    /// Mark a post as published
    Publish { post_id: String },
    /// Move a post back to draft
    Unpublish { post_id: String },
    /// Hide a comment from the public pages
    DeactivateComment { comment_id: String },
    /// Show a previously hidden comment again
    ActivateComment { comment_id: String },
    /// Import posts from a JSON file
    Import {
        file: String,
        #[arg(long)]
        author: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blog=info,tower_http=info")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await?,
        Command::CreateAuthor { username, email } => {
            let author = cli::create_author(&pool, &username, email.as_deref()).await?;
            println!("Created author:");
            println!("  ID: {}", author.id);
            println!("  Username: {}", author.username);
        }
        Command::CreatePost {
            author,
            title,
            body_file,
            slug,
            tags,
            publish_at,
            published,
        } => {
            let body = std::fs::read_to_string(&body_file)
                .with_context(|| format!("reading {body_file}"))?;
            let post = cli::create_post(
                &pool,
                NewPost {
                    author,
                    title,
                    body,
                    slug,
                    tags,
                    publish_at,
                    status: if published { PostStatus::Published } else { PostStatus::Draft },
                },
            )
            .await?;
            println!("Created post:");
            println!("  ID: {}", post.id);
            println!("  Status: {}", post.status);
            println!("  URL: {}", post.absolute_url());
        }
        Command::Publish { post_id } => {
            cli::set_post_status(&pool, &post_id, PostStatus::Published).await?;
            println!("Published {post_id}");
        }
        Command::Unpublish { post_id } => {
            cli::set_post_status(&pool, &post_id, PostStatus::Draft).await?;
            println!("Moved {post_id} back to draft");
        }
        Command::DeactivateComment { comment_id } => {
            cli::set_comment_active(&pool, &comment_id, false).await?;
            println!("Deactivated comment {comment_id}");
        }
        Command::ActivateComment { comment_id } => {
            cli::set_comment_active(&pool, &comment_id, true).await?;
            println!("Activated comment {comment_id}");
        }
        Command::Import { file, author } => {
            let imported = cli::import_posts(&pool, &file, &author).await?;
            println!("Imported {imported} posts");
        }
    }

    Ok(())
}

async fn serve(pool: sqlx::SqlitePool, config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let mailer = Mailer::from_config(&config.mail);
    let app = build_app(AppState::new(pool, config, mailer));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
