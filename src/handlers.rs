//! HTTP route handlers for the web application.
//!
//! Page handlers render HTML; `/api/...` handlers apply one transition to the
//! open entry and redirect back to it (node clicks answer with JSON for the
//! inline script). The session lock is only ever taken between awaits.

use crate::ai::to_data_url;
use crate::detail::DetailSession;
use crate::diagram::{render_chart, ViewportAction};
use crate::error::PracticeError;
use crate::library;
use crate::models::Category;
use crate::practice::PracticeState;
use crate::store;
use crate::templates::{render_detail, render_library, render_new_entry, LibraryLayout};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

fn entry_url(id: &str) -> String {
    format!("/entry/{}", urlencoding::encode(id))
}

fn no_session() -> Response {
    (StatusCode::CONFLICT, "Entry is not open").into_response()
}

fn store_failure(e: crate::error::StoreError) -> Response {
    tracing::error!(error = %e, "store operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {}", e)).into_response()
}

fn practice_failure(e: PracticeError) -> Response {
    let status = match e {
        PracticeError::BlankAnswer => StatusCode::BAD_REQUEST,
        PracticeError::InvalidTransition { .. } => StatusCode::CONFLICT,
    };
    (status, e.to_string()).into_response()
}

// ============================================================================
// Library
// ============================================================================

#[derive(Deserialize)]
pub struct LibraryQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub view: Option<String>,
}

pub async fn index(
    Query(query): Query<LibraryQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    state.close_session();

    let entries = match store::load_entries(state.store.as_ref()) {
        Ok(entries) => entries,
        Err(e) => return store_failure(e),
    };

    let q = query.q.unwrap_or_default();
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "All")
        .and_then(|c| c.parse::<Category>().ok());

    let filtered = library::filter_entries(&entries, &q, category);
    let layout = LibraryLayout::from_param(query.view.as_deref());
    Html(render_library(&filtered, entries.len(), &q, category, layout)).into_response()
}

// ============================================================================
// New Entry
// ============================================================================

pub async fn new_entry_page(State(state): State<Arc<AppState>>) -> Html<String> {
    state.close_session();
    Html(render_new_entry(None))
}

pub async fn create_entry(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut text = String::new();
    let mut images = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => match field.text().await {
                Ok(t) => text = t,
                Err(e) => {
                    return (StatusCode::BAD_REQUEST, format!("Failed to read text: {}", e))
                        .into_response()
                }
            },
            Some("images") => {
                let mime = field
                    .content_type()
                    .filter(|ct| ct.starts_with("image/"))
                    .unwrap_or("image/png")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => images.push(to_data_url(&mime, &bytes)),
                    Ok(_) => {}
                    Err(e) => {
                        return (StatusCode::BAD_REQUEST, format!("Failed to read image: {}", e))
                            .into_response()
                    }
                }
            }
            _ => {}
        }
    }

    match library::create_entry(state.store.as_ref(), state.analyzer.as_ref(), &text, images).await {
        Ok(Some(_)) => Redirect::to("/").into_response(),
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            Html(render_new_entry(Some("Add some text or at least one image first."))),
        )
            .into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn delete_entry(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let was_open = state.with_session(&id, |_| ()).is_some();
    if was_open {
        state.close_session();
    }

    match library::delete_entry(state.store.as_ref(), &id) {
        Ok(true) => Redirect::to("/").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Entry not found").into_response(),
        Err(e) => store_failure(e),
    }
}

// ============================================================================
// Entry Detail
// ============================================================================

pub async fn view_entry(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let entry = match library::find_entry(state.store.as_ref(), &id) {
        Ok(Some(entry)) => entry,
        Ok(None) => return (StatusCode::NOT_FOUND, "Entry not found").into_response(),
        Err(e) => return store_failure(e),
    };

    // Open (or keep) the session and see whether the diagram needs drawing.
    let pending_render = {
        let mut guard = state.session();
        let is_open = matches!(guard.as_ref(), Some(s) if s.entry_id() == id);
        if !is_open {
            match DetailSession::open(state.store.as_ref(), entry) {
                Ok(session) => {
                    if let Some(previous) = guard.replace(session) {
                        state.discard_session(previous);
                    }
                }
                Err(e) => return store_failure(e),
            }
        }
        guard
            .as_ref()
            .filter(|s| s.needs_render())
            .map(|s| s.render_input())
    };

    if let Some((diagram_id, chart)) = pending_render {
        let outcome = render_chart(state.engine.as_ref(), &diagram_id, chart.as_deref()).await;
        state.with_session(&id, |session| {
            if session.needs_render() {
                session.install_diagram(outcome);
            }
        });
    }

    match state.with_session(&id, |session| render_detail(session)) {
        Some(html) => Html(html).into_response(),
        // Another entry was opened while the diagram rendered.
        None => Redirect::to(&entry_url(&id)).into_response(),
    }
}

pub async fn click_node(
    Path((id, node)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let store = state.store.clone();
    match state.with_session(&id, |session| session.click_node(store.as_ref(), &node)) {
        Some(Ok(term)) => Json(serde_json::json!({ "term": term })).into_response(),
        Some(Err(e)) => store_failure(e),
        None => no_session(),
    }
}

pub async fn diagram_action(
    Path((id, action)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Ok(action) = action.parse::<ViewportAction>() else {
        return (StatusCode::BAD_REQUEST, "Unknown diagram action").into_response();
    };
    match state.with_session(&id, |session| session.diagram_mut().apply(action)) {
        Some(_) => Redirect::to(&format!("{}#diagram", entry_url(&id))).into_response(),
        None => no_session(),
    }
}

// ============================================================================
// Practice
// ============================================================================

pub async fn practice_start(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let begun = state.with_session(&id, |session| {
        let practice = session.practice_mut();
        match practice.state() {
            PracticeState::Result { .. } => practice.retry(),
            _ => practice.start(),
        }
    });

    let context = match begun {
        Some(Ok(context)) => context,
        Some(Err(e)) => return practice_failure(e),
        None => return no_session(),
    };

    let result = state.practice.generate_challenge(&context).await;
    let completed = state.with_session(&id, |session| session.practice_mut().challenge_loaded(result));

    match completed {
        Some(Err(e)) => practice_failure(e),
        _ => Redirect::to(&format!("{}#practice", entry_url(&id))).into_response(),
    }
}

#[derive(Deserialize)]
pub struct AnswerForm {
    pub answer: String,
}

pub async fn practice_submit(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnswerForm>,
) -> Response {
    let begun = state.with_session(&id, |session| {
        let practice = session.practice_mut();
        // Keep the draft even if the submit is rejected as blank.
        if practice.is_answer_editable() {
            practice.set_answer(form.answer.clone())?;
        }
        practice.submit(form.answer.clone())
    });

    let request = match begun {
        Some(Ok(request)) => request,
        Some(Err(PracticeError::BlankAnswer)) => {
            return Redirect::to(&format!("{}#practice", entry_url(&id))).into_response()
        }
        Some(Err(e)) => return practice_failure(e),
        None => return no_session(),
    };

    let result = state
        .practice
        .evaluate(&request.context, &request.question, &request.answer)
        .await;
    let completed =
        state.with_session(&id, |session| session.practice_mut().evaluation_finished(result));

    match completed {
        Some(Err(e)) => practice_failure(e),
        _ => Redirect::to(&format!("{}#practice", entry_url(&id))).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagram::DiagramEngine;
    use crate::error::{AiError, DiagramError};
    use crate::models::{AnalysisResult, ContextType, EvaluationResult, PracticeChallenge};
    use crate::store::MemoryStore;
    use crate::ai::{AnalysisService, PracticeService};
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl AnalysisService for Offline {
        async fn analyze(&self, _text: &str, _images: &[String]) -> Result<AnalysisResult, AiError> {
            Err(AiError::MissingApiKey)
        }
    }

    #[async_trait]
    impl PracticeService for Offline {
        async fn generate_challenge(&self, _context: &str) -> Result<PracticeChallenge, AiError> {
            Ok(PracticeChallenge {
                question: "Which flag keeps your changes?".to_string(),
                context_type: ContextType::Concept,
            })
        }

        async fn evaluate(
            &self,
            _context: &str,
            _question: &str,
            answer: &str,
        ) -> Result<EvaluationResult, AiError> {
            Ok(EvaluationResult {
                is_correct: answer.contains("--soft"),
                score: if answer.contains("--soft") { 95 } else { 10 },
                feedback: "ok".to_string(),
                correct_solution: "--soft".to_string(),
            })
        }
    }

    #[async_trait]
    impl DiagramEngine for Offline {
        async fn render(&self, _id: &str, _source: &str) -> Result<String, DiagramError> {
            Ok(r#"<svg width="10"><g class="node" id="flowchart-A-0"><text>Commit made</text></g></svg>"#.to_string())
        }
    }

    fn state() -> Arc<AppState> {
        let config = Config::from_lookup(|_| None).unwrap();
        let offline = Arc::new(Offline);
        Arc::new(AppState::with_services(
            config,
            Arc::new(MemoryStore::new()),
            offline.clone(),
            offline.clone(),
            offline,
        ))
    }

    #[tokio::test]
    async fn test_view_click_and_practice_flow() {
        let state = state();

        let response = view_entry(Path("1".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.with_session("1", |s| s.needs_render()) == Some(false));

        let response = click_node(
            Path(("1".to_string(), "flowchart-A-0".to_string())),
            State(state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            store::load_term(state.store.as_ref(), "1").unwrap().as_deref(),
            Some("Commit made")
        );

        practice_start(Path("1".to_string()), State(state.clone())).await;
        let response = practice_submit(
            Path("1".to_string()),
            State(state.clone()),
            Form(AnswerForm {
                answer: "git reset --soft HEAD~1".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let score = state.with_session("1", |s| s.practice().evaluation().map(|e| e.score));
        assert_eq!(score, Some(Some(95)));
    }

    #[tokio::test]
    async fn test_actions_require_open_entry() {
        let state = state();
        let response = diagram_action(
            Path(("1".to_string(), "zoom-in".to_string())),
            State(state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        view_entry(Path("1".to_string()), State(state.clone())).await;
        let response = diagram_action(
            Path(("1".to_string(), "spin".to_string())),
            State(state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_leaving_detail_discards_session() {
        let state = state();
        view_entry(Path("1".to_string()), State(state.clone())).await;
        practice_start(Path("1".to_string()), State(state.clone())).await;

        index(
            Query(LibraryQuery {
                q: None,
                category: None,
                view: None,
            }),
            State(state.clone()),
        )
        .await;
        assert!(state.session().is_none());
    }

    #[tokio::test]
    async fn test_term_lasts_only_while_viewing() {
        let state = state();
        let library = || Query(LibraryQuery { q: None, category: None, view: None });

        view_entry(Path("1".to_string()), State(state.clone())).await;
        click_node(
            Path(("1".to_string(), "flowchart-A-0".to_string())),
            State(state.clone()),
        )
        .await;

        // Reloading the same view keeps the term.
        view_entry(Path("1".to_string()), State(state.clone())).await;
        let term = state.with_session("1", |s| s.active_term().map(str::to_string));
        assert_eq!(term, Some(Some("Commit made".to_string())));

        index(library(), State(state.clone())).await;
        assert_eq!(store::load_term(state.store.as_ref(), "1").unwrap(), None);

        view_entry(Path("1".to_string()), State(state.clone())).await;
        let term = state.with_session("1", |s| s.active_term().map(str::to_string));
        assert_eq!(term, Some(None));

        click_node(
            Path(("1".to_string(), "flowchart-A-0".to_string())),
            State(state.clone()),
        )
        .await;
        new_entry_page(State(state.clone())).await;
        assert_eq!(store::load_term(state.store.as_ref(), "1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_opening_another_entry_clears_previous_term() {
        let state = state();
        let mut entries = store::sample_entries();
        let mut second = entries[0].clone();
        second.id = "2".to_string();
        entries.push(second);
        store::save_entries(state.store.as_ref(), &entries).unwrap();

        view_entry(Path("1".to_string()), State(state.clone())).await;
        click_node(
            Path(("1".to_string(), "flowchart-A-0".to_string())),
            State(state.clone()),
        )
        .await;
        view_entry(Path("2".to_string()), State(state.clone())).await;

        assert_eq!(store::load_term(state.store.as_ref(), "1").unwrap(), None);
        assert!(state.with_session("2", |_| ()).is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_entry() {
        let state = state();
        let response = delete_entry(Path("nope".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
