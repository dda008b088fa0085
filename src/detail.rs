//! Per-view state of an open entry.
//!
//! A `DetailSession` is created when an entry is opened and closed when the
//! user leaves it. It owns the active highlight term, the diagram view with
//! its interaction layer, and the practice session. The term is saved on every
//! change so a reload of the same view restores it, and `close` removes it.

use crate::diagram::{render_chart, DiagramEngine, DiagramView, NodeClickHandler, RenderOutcome};
use crate::error::StoreError;
use crate::highlight::highlight;
use crate::models::{KnowledgeEntry, RenderBlock, Segment};
use crate::practice::PracticeSession;
use crate::segment::segment;
use crate::store::{self, KeyValueStore};
use std::sync::mpsc;
use std::sync::Arc;

pub struct DetailSession {
    entry: KnowledgeEntry,
    active_term: Option<String>,
    diagram: DiagramView,
    practice: PracticeSession,
    clicked: mpsc::Receiver<String>,
    on_node_click: NodeClickHandler,
}

impl std::fmt::Debug for DetailSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailSession")
            .field("entry", &self.entry.id)
            .field("active_term", &self.active_term)
            .field("diagram", &self.diagram)
            .field("practice", &self.practice)
            .finish_non_exhaustive()
    }
}

impl DetailSession {
    /// Open `entry`, restoring its saved highlight term.
    pub fn open(store: &dyn KeyValueStore, entry: KnowledgeEntry) -> Result<Self, StoreError> {
        let active_term = store::load_term(store, &entry.id)?;
        let (sender, clicked) = mpsc::channel::<String>();
        let on_node_click: NodeClickHandler = Arc::new(move |label: &str| {
            // The receiver only goes away together with the session.
            let _ = sender.send(label.to_string());
        });

        let context = practice_context(&entry);
        tracing::debug!(id = %entry.id, term = ?active_term, "opened entry");
        Ok(Self {
            diagram: DiagramView::new(format!("diagram-{}", entry.id)),
            practice: PracticeSession::new(context),
            entry,
            active_term,
            clicked,
            on_node_click,
        })
    }

    /// Leave the view. Its highlight term goes with it.
    pub fn close(self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        tracing::debug!(id = %self.entry.id, "closed entry");
        store::save_term(store, &self.entry.id, None)
    }

    pub fn entry(&self) -> &KnowledgeEntry {
        &self.entry
    }

    pub fn entry_id(&self) -> &str {
        &self.entry.id
    }

    pub fn active_term(&self) -> Option<&str> {
        self.active_term.as_deref()
    }

    /// Change the active term, then persist it. A blank term clears it.
    pub fn set_term(&mut self, store: &dyn KeyValueStore, term: Option<&str>) -> Result<(), StoreError> {
        self.active_term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        store::save_term(store, &self.entry.id, self.active_term.as_deref())
    }

    /// Handle a click on diagram node `node_id`. A bound node makes its label
    /// the active term; returns the new term.
    pub fn click_node(
        &mut self,
        store: &dyn KeyValueStore,
        node_id: &str,
    ) -> Result<Option<String>, StoreError> {
        self.diagram.click(node_id);
        let Some(label) = self.clicked.try_iter().last() else {
            return Ok(None);
        };
        tracing::debug!(id = %self.entry.id, node_id, label = %label, "diagram node clicked");
        self.set_term(store, Some(&label))?;
        Ok(self.active_term.clone())
    }

    /// Raw content split into paragraphs and tables, highlighted.
    pub fn blocks(&self) -> Vec<RenderBlock> {
        segment(&self.entry.raw_content, self.active_term())
    }

    pub fn highlight(&self, text: &str) -> Vec<Segment> {
        highlight(text, self.active_term())
    }

    pub fn diagram(&self) -> &DiagramView {
        &self.diagram
    }

    pub fn diagram_mut(&mut self) -> &mut DiagramView {
        &mut self.diagram
    }

    /// Whether the diagram still has to be rendered for this view.
    pub fn needs_render(&self) -> bool {
        self.diagram.outcome().is_none()
    }

    /// The id and chart to hand to `render_chart`.
    pub fn render_input(&self) -> (String, Option<String>) {
        (
            self.diagram.base_id().to_string(),
            self.entry.mermaid_chart.clone(),
        )
    }

    /// Install a render result and rebind node clicks to this session.
    pub fn install_diagram(&mut self, outcome: RenderOutcome) -> &RenderOutcome {
        let handler = self.on_node_click.clone();
        self.diagram.install(outcome, Some(handler))
    }

    /// Render the entry's chart while holding the session.
    pub async fn render_diagram<E>(&mut self, engine: &E) -> &RenderOutcome
    where
        E: DiagramEngine + ?Sized,
    {
        let (id, chart) = self.render_input();
        let outcome = render_chart(engine, &id, chart.as_deref()).await;
        self.install_diagram(outcome)
    }

    pub fn practice(&self) -> &PracticeSession {
        &self.practice
    }

    pub fn practice_mut(&mut self) -> &mut PracticeSession {
        &mut self.practice
    }
}

/// Text practice questions are generated from.
pub fn practice_context(entry: &KnowledgeEntry) -> String {
    format!("{}\n\n{}", entry.summary, entry.raw_content)
        .trim()
        .to_string()
}
