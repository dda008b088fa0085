//! DevBrain - a personal knowledge base for technical notes.
//!
//! This is the main entry point for the web server.
//! The application is organized into the following modules:
//!
//! - `models`: Entries, categories and the AI exchange types
//! - `store`: sled-backed persistence of entries and highlight terms
//! - `ai`: Gemini analysis, practice questions and grading
//! - `highlight` / `segment`: text cleaning, term highlighting and tables
//! - `diagram`: mermaid repair, rendering, zoom and node clicks
//! - `practice`: the practice session state machine
//! - `detail`: per-entry view state
//! - `templates`: HTML/CSS/JS templates and rendering
//! - `handlers`: HTTP route handlers

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devbrain::{config::Config, handlers, AppState};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devbrain=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    let addr = config.addr.clone();
    let db_path = config.db_path.clone();
    let ai_enabled = config.gemini_api_key.is_some();
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        // Library routes
        .route("/", get(handlers::index))
        .route("/new", get(handlers::new_entry_page).post(handlers::create_entry))
        // Entry routes
        .route("/entry/{id}", get(handlers::view_entry))
        .route("/api/entry/{id}/delete", post(handlers::delete_entry))
        .route("/api/entry/{id}/node/{node}", post(handlers::click_node))
        .route("/api/entry/{id}/diagram/{action}", post(handlers::diagram_action))
        // Practice routes
        .route("/api/entry/{id}/practice/start", post(handlers::practice_start))
        .route("/api/entry/{id}/practice/submit", post(handlers::practice_submit))
        .with_state(state)
        // Screenshots arrive inline in the add form.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    tracing::info!("DevBrain running at http://{}", addr);
    tracing::info!("Database: {}", db_path.display());
    if ai_enabled {
        tracing::info!("AI analysis: ENABLED");
    } else {
        tracing::info!("AI analysis: DISABLED (set GEMINI_API_KEY to enable; fallbacks apply)");
    }

    axum::serve(listener, app).await.expect("Server error");
}
