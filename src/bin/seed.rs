//! Seed binary - inserts demo posts and translates each into every locale
//!
//! Usage:
//!   cargo run --bin seed
//!
//! Uses the same environment as the server (DATABASE_URL, TRANSLATE_API_URL, ...).
//! Without DATABASE_URL the posts only live for the duration of the run.

use anyhow::Result;
use blog_translate::{app, config::Config, db::PostStore, models::NewPost};
use tracing::info;

const DEMO_POSTS: [(&str, &str); 3] = [
    (
        "Welcome to the Translation Blog",
        "This is a demo post to showcase the automatic translation feature.",
    ),
    (
        "Google Translate Integration",
        "Learn how posts are translated automatically through the Google Translate endpoint.",
    ),
    (
        "Multi-language Support",
        "Serve every post in English, Hindi and Gujarati without writing a translation by hand.",
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blog_translate=info".parse()?)
                .add_directive("seed=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let state = app::build_state(&config).await?;

    for (title, content) in DEMO_POSTS {
        let mut post = state
            .store
            .create_post(NewPost {
                title: title.to_string(),
                content: content.to_string(),
            })
            .await?;
        state
            .coordinator
            .translate_and_persist(&mut post, None)
            .await?;
        info!("Seeded post {}: {}", post.id, post.title);
    }

    let report = state.metrics.report();
    info!(
        "Seeded {} posts ({} translation requests, {} degraded)",
        DEMO_POSTS.len(),
        report.api_calls,
        report.degraded_translations
    );
    Ok(())
}
