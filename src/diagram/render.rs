//! Two-attempt diagram rendering and the per-view diagram controller.
//!
//! Attempt one renders the normalized source. If the engine rejects it,
//! attempt two renders the fallback-repaired source under a distinct id.
//! A second rejection produces a failure message; there is no third try.

use super::engine::DiagramEngine;
use super::interaction::{InteractionLayer, NodeClickHandler};
use super::normalize::{normalize, repair_fallback};
use super::viewport::{Viewport, ViewportAction};
use regex::Regex;
use std::sync::LazyLock;

pub const RENDER_FAILURE_MESSAGE: &str =
    "Could not render the diagram. The syntax might be invalid.";

static SVG_OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").unwrap());
static SIZE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s(?:width|height)\s*=\s*("[^"]*"|'[^']*')"#).unwrap());
static MAX_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max-width\s*:\s*[^;\x22']*;?\s*").unwrap());

// ============================================================================
// Attempts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderAttempt {
    First { id: String, source: String },
    Retry { id: String, source: String },
}

impl RenderAttempt {
    /// The first attempt for `chart`, or `None` when there is nothing to draw.
    pub fn first(base_id: &str, chart: Option<&str>) -> Option<Self> {
        let chart = chart.map(str::trim).filter(|c| !c.is_empty())?;
        Some(RenderAttempt::First {
            id: base_id.to_string(),
            source: normalize(chart),
        })
    }

    /// The attempt to make after this one failed, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            RenderAttempt::First { id, source } => Some(RenderAttempt::Retry {
                id: format!("{}-retry", id),
                source: repair_fallback(source),
            }),
            RenderAttempt::Retry { .. } => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RenderAttempt::First { id, .. } | RenderAttempt::Retry { id, .. } => id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            RenderAttempt::First { source, .. } | RenderAttempt::Retry { source, .. } => source,
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, RenderAttempt::Retry { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub markup: String,
    /// The source that the engine accepted.
    pub source: String,
    pub retried: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No chart; nothing is drawn.
    Empty,
    Rendered(RenderedDiagram),
    Failed(String),
}

/// Render `chart` with at most two attempts.
pub async fn render_chart<E>(engine: &E, base_id: &str, chart: Option<&str>) -> RenderOutcome
where
    E: DiagramEngine + ?Sized,
{
    let Some(mut attempt) = RenderAttempt::first(base_id, chart) else {
        return RenderOutcome::Empty;
    };

    loop {
        match engine.render(attempt.id(), attempt.source()).await {
            Ok(svg) => {
                return RenderOutcome::Rendered(RenderedDiagram {
                    markup: scale_to_container(&svg),
                    source: attempt.source().to_string(),
                    retried: attempt.is_retry(),
                });
            }
            Err(e) => {
                tracing::warn!(id = attempt.id(), error = %e, "diagram render attempt failed");
                match attempt.next() {
                    Some(next) => attempt = next,
                    None => return RenderOutcome::Failed(RENDER_FAILURE_MESSAGE.to_string()),
                }
            }
        }
    }
}

/// Make the root `<svg>` follow its container's width so zoom can drive it.
pub fn scale_to_container(svg: &str) -> String {
    let Some(open) = SVG_OPEN_TAG_RE.find(svg) else {
        return svg.to_string();
    };

    let tag = SIZE_ATTR_RE.replace_all(open.as_str(), "");
    let tag = MAX_WIDTH_RE.replace_all(&tag, "");
    let tag = tag.replace(" style=\"\"", "");
    let tag = match tag.strip_suffix("/>") {
        Some(head) => format!("{} width=\"100%\"/>", head.trim_end()),
        None => format!("{} width=\"100%\">", tag.trim_end_matches('>').trim_end()),
    };

    format!("{}{}{}", &svg[..open.start()], tag, &svg[open.end()..])
}

// ============================================================================
// Controller
// ============================================================================

/// Owns one rendered diagram, its display state and its interaction layer.
#[derive(Debug)]
pub struct DiagramView {
    base_id: String,
    viewport: Viewport,
    outcome: Option<RenderOutcome>,
    layer: Option<InteractionLayer>,
}

impl DiagramView {
    pub fn new(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            viewport: Viewport::default(),
            outcome: None,
            layer: None,
        }
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// `None` until the first render has completed.
    pub fn outcome(&self) -> Option<&RenderOutcome> {
        self.outcome.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn apply(&mut self, action: ViewportAction) -> bool {
        self.viewport.apply(action)
    }

    /// Render `chart` and install the result.
    pub async fn render<E>(
        &mut self,
        engine: &E,
        chart: Option<&str>,
        on_node_click: Option<NodeClickHandler>,
    ) -> &RenderOutcome
    where
        E: DiagramEngine + ?Sized,
    {
        self.dispose_layer();
        let outcome = render_chart(engine, &self.base_id, chart).await;
        self.install(outcome, on_node_click)
    }

    /// Replace the current output with `outcome`, detaching the previous
    /// interaction layer and attaching a new one to successful markup.
    pub fn install(
        &mut self,
        outcome: RenderOutcome,
        on_node_click: Option<NodeClickHandler>,
    ) -> &RenderOutcome {
        self.dispose_layer();
        if let (RenderOutcome::Rendered(diagram), Some(handler)) = (&outcome, on_node_click) {
            self.layer = Some(InteractionLayer::attach(&diagram.markup, handler));
        }
        self.outcome.insert(outcome)
    }

    /// Forward a click on `node_id`; returns the label that was dispatched.
    pub fn click(&self, node_id: &str) -> Option<String> {
        self.layer.as_ref()?.click(node_id).map(str::to_string)
    }

    pub fn layer(&self) -> Option<&InteractionLayer> {
        self.layer.as_ref()
    }

    fn dispose_layer(&mut self) {
        if let Some(layer) = self.layer.take() {
            layer.dispose();
        }
    }
}
