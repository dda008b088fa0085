//! Node interaction layer for rendered diagrams.
//!
//! After every successful render the layer is attached to the new markup: each
//! node element is bound to its cleaned, visible label. Clicking a node id
//! forwards that label to the click handler. Replacing the markup invalidates
//! the bindings, so the previous layer is disposed before the next attach.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static VOID_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|input|wbr|col)((?:\s[^<>]*?)?)\s*/?>").unwrap()
});
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

/// Callback invoked with the cleaned label of a clicked node.
pub type NodeClickHandler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBinding {
    pub node_id: String,
    pub label: String,
}

pub struct InteractionLayer {
    bindings: Vec<NodeBinding>,
    by_id: HashMap<String, usize>,
    handler: NodeClickHandler,
}

impl std::fmt::Debug for InteractionLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionLayer")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl InteractionLayer {
    /// Bind every node element found in `markup` to `handler`.
    pub fn attach(markup: &str, handler: NodeClickHandler) -> Self {
        let bindings = discover_nodes(markup);
        let by_id = bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (b.node_id.clone(), i))
            .collect();
        tracing::debug!(nodes = bindings.len(), "attached diagram interaction layer");
        Self {
            bindings,
            by_id,
            handler,
        }
    }

    pub fn bindings(&self) -> &[NodeBinding] {
        &self.bindings
    }

    /// Dispatch a click on `node_id`. Returns the label forwarded to the
    /// handler, or `None` when the id is not a bound node.
    pub fn click(&self, node_id: &str) -> Option<&str> {
        let binding = &self.bindings[*self.by_id.get(node_id)?];
        if binding.label.is_empty() {
            return None;
        }
        (self.handler)(binding.label.as_str());
        Some(binding.label.as_str())
    }

    /// Detach all handlers. Must be called before the markup is replaced.
    pub fn dispose(self) {
        tracing::debug!(nodes = self.bindings.len(), "disposed diagram interaction layer");
    }
}

/// Find node groups (`<g class="node ...">`) and their visible labels.
pub fn discover_nodes(markup: &str) -> Vec<NodeBinding> {
    let markup = xml_compatible(markup);
    let doc = match roxmltree::Document::parse(&markup) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "diagram markup is not well-formed; no nodes bound");
            return Vec::new();
        }
    };

    doc.descendants()
        .filter(|n| n.has_tag_name("g") && is_node_group(n))
        .filter_map(|n| {
            let node_id = n.attribute("id")?.to_string();
            let text = n
                .descendants()
                .filter(|d| d.is_text())
                .filter(|d| {
                    !d.ancestors()
                        .any(|a| a.has_tag_name("style") || a.has_tag_name("title"))
                })
                .filter_map(|d| d.text())
                .collect::<Vec<_>>()
                .join(" ");
            Some(NodeBinding {
                node_id,
                label: clean_label(&text),
            })
        })
        .collect()
}

/// Labels inside `foreignObject` are serialized as HTML. Close void
/// elements and turn HTML-only named entities into character references.
fn xml_compatible(markup: &str) -> Cow<'_, str> {
    let closed = VOID_TAG_RE.replace_all(markup, "<$1$2/>");
    if !ENTITY_RE.is_match(&closed) {
        return closed;
    }
    let fixed = ENTITY_RE.replace_all(&closed, |caps: &Captures| match &caps[1] {
        "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
        "nbsp" => "&#160;".to_string(),
        other => format!("&amp;{};", other),
    });
    Cow::Owned(fixed.into_owned())
}

fn is_node_group(node: &roxmltree::Node) -> bool {
    node.attribute("class")
        .map(|class| class.split_whitespace().any(|c| c == "node"))
        .unwrap_or(false)
}

/// Strip shape delimiters and quotes left in a node's text and collapse
/// whitespace.
pub fn clean_label(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | '"' | '\''))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
