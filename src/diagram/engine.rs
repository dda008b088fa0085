//! The external diagram engine.
//!
//! Layout and drawing are not done here. An engine takes diagram source and
//! returns SVG markup, or rejects the source as invalid. The production engine
//! is the mermaid.ink rendering service.

use crate::error::DiagramError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait DiagramEngine: Send + Sync {
    /// Render `source` to SVG markup. `id` identifies this render attempt.
    async fn render(&self, id: &str, source: &str) -> Result<String, DiagramError>;
}

/// Renders mermaid source through a mermaid.ink compatible service.
pub struct MermaidInk {
    client: reqwest::Client,
    base_url: Url,
}

impl MermaidInk {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, DiagramError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn svg_url(&self, source: &str) -> String {
        let encoded = URL_SAFE.encode(source.as_bytes());
        format!("{}/svg/{}", self.base_url.as_str().trim_end_matches('/'), encoded)
    }
}

#[async_trait]
impl DiagramEngine for MermaidInk {
    async fn render(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        tracing::debug!(id, chars = source.len(), "rendering diagram via mermaid.ink");

        let response = self.client.get(self.svg_url(source)).send().await?;
        if !response.status().is_success() {
            return Err(DiagramError::InvalidSyntax(format!(
                "service returned status {}",
                response.status()
            )));
        }

        // Syntax errors come back as an HTML error page.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);
        if is_html {
            return Err(DiagramError::InvalidSyntax(
                "service returned an error page".to_string(),
            ));
        }

        let body = response.text().await?;
        let start = body.trim_start();
        if !start.starts_with("<svg") && !start.starts_with("<?xml") {
            return Err(DiagramError::InvalidSyntax(
                "service did not return SVG".to_string(),
            ));
        }

        tracing::debug!(id, bytes = body.len(), "diagram rendered");
        Ok(body)
    }
}
