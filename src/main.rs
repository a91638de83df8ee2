//! hanzi-helper - Chinese character learning chat bot
//!
//! A Rust backend implementing a dialog state machine that tells students
//! which characters of a phrase they have already learned.

mod api;
mod catalog;
mod command;
mod config;
mod db;
mod lexicon;
mod practice;
mod reply;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use db::{CatalogSeed, Database};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired practice questions are swept
const PRACTICE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hanzi_helper=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    if let Some(seed_path) = &config.catalog_seed {
        let seed: CatalogSeed = serde_json::from_str(&std::fs::read_to_string(seed_path)?)?;
        let summary = db.import_catalog(&seed)?;
        tracing::info!(
            path = %seed_path.display(),
            lessons = summary.lessons,
            characters = summary.characters,
            "Catalog seed imported"
        );
    }
    if db.lesson_count()? == 0 {
        tracing::warn!("Lesson catalog is empty. Set HANZI_CATALOG_SEED to import one.");
    }

    // Create application state
    let state = AppState::new(db, &config);

    // Evict stale practice questions in the background
    let practice = state.practice.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRACTICE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            practice.sweep_expired();
        }
    });

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("hanzi-helper server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
