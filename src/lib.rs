//! DevBrain library - re-exports for testing and external use.
//!
//! This module provides public access to all the application's modules
//! and the shared application state used by the HTTP handlers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod ai;
pub mod config;
pub mod detail;
pub mod diagram;
pub mod error;
pub mod handlers;
pub mod highlight;
pub mod library;
pub mod models;
pub mod practice;
pub mod segment;
pub mod store;
pub mod templates;

use ai::{AnalysisService, GeminiClient, PracticeService};
use config::Config;
use detail::DetailSession;
use diagram::{DiagramEngine, MermaidInk};
use store::{KeyValueStore, SledStore};

// ============================================================================
// Configuration
// ============================================================================

pub const DB_PATH: &str = ".devbrain_db";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub analyzer: Arc<dyn AnalysisService>,
    pub practice: Arc<dyn PracticeService>,
    pub engine: Arc<dyn DiagramEngine>,
    /// The entry currently open in the detail view, if any. Never held
    /// across an await.
    current: Mutex<Option<DetailSession>>,
}

impl AppState {
    /// Open the database and build the HTTP-backed services.
    pub fn new(config: Config) -> Self {
        let store = SledStore::open(&config.db_path).expect("Failed to open database");
        let gemini = Arc::new(
            GeminiClient::new(
                config.gemini_base_url.clone(),
                config.gemini_model.clone(),
                config.gemini_api_key.clone(),
                config.http_timeout,
            )
            .expect("Failed to build AI client"),
        );
        let engine = MermaidInk::new(config.mermaid_ink_url.clone(), config.http_timeout)
            .expect("Failed to build diagram client");

        Self::with_services(config, Arc::new(store), gemini.clone(), gemini, Arc::new(engine))
    }

    pub fn with_services(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        analyzer: Arc<dyn AnalysisService>,
        practice: Arc<dyn PracticeService>,
        engine: Arc<dyn DiagramEngine>,
    ) -> Self {
        Self {
            config,
            store,
            analyzer,
            practice,
            engine,
            current: Mutex::new(None),
        }
    }

    pub fn session(&self) -> MutexGuard<'_, Option<DetailSession>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the open session for `entry_id`. Returns `None` when that
    /// entry is not the one currently open.
    pub fn with_session<T>(
        &self,
        entry_id: &str,
        f: impl FnOnce(&mut DetailSession) -> T,
    ) -> Option<T> {
        let mut guard = self.session();
        match guard.as_mut() {
            Some(session) if session.entry_id() == entry_id => Some(f(session)),
            _ => None,
        }
    }

    /// Leave the detail view and drop everything it held.
    pub fn close_session(&self) {
        let closed = self.session().take();
        if let Some(session) = closed {
            self.discard_session(session);
        }
    }

    /// Close a session that is no longer current.
    pub fn discard_session(&self, session: DetailSession) {
        let id = session.entry_id().to_string();
        if let Err(e) = session.close(self.store.as_ref()) {
            tracing::warn!(id = %id, error = %e, "failed to clear highlight term");
        }
    }
}

// Re-export commonly used types
pub use models::{
    AnalysisResult, Category, CodeSnippet, ContextType, EvaluationResult, KnowledgeEntry,
    PracticeChallenge, RenderBlock, Segment,
};

pub use error::{AiError, ConfigError, DiagramError, PracticeError, StoreError, UnknownCategory};

pub use highlight::{clean, highlight};
pub use segment::segment;

pub use diagram::{normalize, render_chart, repair_fallback, RenderOutcome, Viewport, ViewportAction};

pub use practice::{PracticeSession, PracticeState};

pub use library::{create_entry, delete_entry, filter_entries, find_entry};

pub use store::{load_entries, save_entries, MemoryStore, ENTRIES_KEY};

pub use templates::{base_html, html_escape, STYLE};
