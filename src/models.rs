//! Data models for the knowledge base.
//!
//! This module contains the durable entry types, the shapes exchanged with the
//! AI provider, and the ephemeral types produced while rendering and practicing.

use crate::error::UnknownCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

// ============================================================================
// Core Entry Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub raw_content: String,
    pub category: Category,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub code_snippets: Vec<CodeSnippet>,
    #[serde(default)]
    pub mermaid_chart: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeSnippet {
    #[serde(default)]
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Procedure,
    Definition,
    Troubleshooting,
    General,
    Snippet,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Procedure,
        Category::Definition,
        Category::Troubleshooting,
        Category::General,
        Category::Snippet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Procedure => "Procedure",
            Category::Definition => "Definition",
            Category::Troubleshooting => "Troubleshooting",
            Category::General => "General",
            Category::Snippet => "Snippet",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the English names plus the Spanish labels the model was
    /// originally prompted with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "procedure" | "procedimiento" => Ok(Category::Procedure),
            "definition" | "definición" | "definicion" => Ok(Category::Definition),
            "troubleshooting" | "solución de problemas" | "solucion de problemas" => {
                Ok(Category::Troubleshooting)
            }
            "general" => Ok(Category::General),
            "snippet" | "code snippet" | "fragmento de código" | "fragmento de codigo" => {
                Ok(Category::Snippet)
            }
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

// ============================================================================
// AI Analysis
// ============================================================================

/// Structured result of analysing a user's notes and screenshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub code_snippets: Vec<CodeSnippet>,
    #[serde(default)]
    pub mermaid_chart: String,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub suggested_category: String,
    #[serde(default)]
    pub title_suggestion: String,
    #[serde(default)]
    pub extracted_content: String,
}

impl AnalysisResult {
    /// The shape substituted whenever analysis fails, so saving never does.
    pub fn fallback(text: &str) -> Self {
        Self {
            summary: "Could not analyze the content automatically.".to_string(),
            steps: Vec::new(),
            code_snippets: Vec::new(),
            mermaid_chart: String::new(),
            suggested_tags: vec!["Uncategorized".to_string()],
            suggested_category: Category::General.to_string(),
            title_suggestion: "New Entry".to_string(),
            extracted_content: text.to_string(),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// A run of text produced by the term highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Emphasized(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(s) | Segment::Emphasized(s) => s,
        }
    }
}

/// One structural unit of segmented free-form text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    Paragraph(Vec<Segment>),
    Blank,
    /// Cells keep their raw text; highlighting is applied per cell when drawn.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

// ============================================================================
// Practice
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Code,
    Concept,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeChallenge {
    pub question: String,
    pub context_type: ContextType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub is_correct: bool,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub correct_solution: String,
}

/// Scores arrive as arbitrary JSON numbers; keep them within 0..=100.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
