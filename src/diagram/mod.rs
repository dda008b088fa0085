//! Diagram support: source repair, external rendering, display state and
//! node interaction.

pub mod engine;
pub mod interaction;
pub mod normalize;
pub mod render;
pub mod viewport;

pub use engine::{DiagramEngine, MermaidInk};
pub use interaction::{InteractionLayer, NodeBinding, NodeClickHandler};
pub use normalize::{normalize, repair_fallback};
pub use render::{
    render_chart, DiagramView, RenderAttempt, RenderOutcome, RenderedDiagram,
    RENDER_FAILURE_MESSAGE,
};
pub use viewport::{DisplayMode, Viewport, ViewportAction};
