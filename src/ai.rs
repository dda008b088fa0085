//! AI collaborators: entry analysis and practice question/evaluation.
//!
//! The traits are the seams the rest of the crate depends on. `GeminiClient`
//! implements both against the Gemini `generateContent` REST endpoint, asking
//! for JSON output constrained by a response schema.

use crate::error::AiError;
use crate::models::{AnalysisResult, Category, EvaluationResult, PracticeChallenge};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Structure free-form notes and screenshots (data URLs) into an entry.
    async fn analyze(&self, text: &str, images: &[String]) -> Result<AnalysisResult, AiError>;
}

#[async_trait]
pub trait PracticeService: Send + Sync {
    async fn generate_challenge(&self, context: &str) -> Result<PracticeChallenge, AiError>;

    async fn evaluate(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<EvaluationResult, AiError>;
}

/// Analyze, substituting the fixed fallback result on any failure.
pub async fn analyze_or_fallback<S>(service: &S, text: &str, images: &[String]) -> AnalysisResult
where
    S: AnalysisService + ?Sized,
{
    match service.analyze(text, images).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "analysis failed, using fallback result");
            AnalysisResult::fallback(text)
        }
    }
}

// ============================================================================
// Image payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64 data without the `data:` prefix.
    pub data: String,
}

/// Split a `data:<mime>;base64,<data>` URL. A bare base64 string is accepted
/// as `image/png`. Returns `None` when the data is not valid base64.
pub fn parse_data_url(url: &str) -> Option<ImagePayload> {
    let (mime_type, data) = match url.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',')?;
            let mime = header.split(';').next().unwrap_or("").trim();
            let mime = if mime.contains('/') { mime } else { "image/png" };
            (mime.to_string(), data.trim())
        }
        None => ("image/png".to_string(), url.trim()),
    };

    if data.is_empty() || STANDARD.decode(data).is_err() {
        return None;
    }

    Some(ImagePayload {
        mime_type,
        data: data.to_string(),
    })
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

// ============================================================================
// Gemini
// ============================================================================

const ANALYSIS_SYSTEM_INSTRUCTION: &str = "You are a senior technical writer and systems architect. \
Turn messy notes and screenshots into clear, structured, actionable documentation.";

const PRACTICE_SYSTEM_INSTRUCTION: &str = "You are a strict but encouraging technical tutor. \
You write short practice questions and grade answers against the reference material.";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        base_url: Url,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            model: model.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }

    /// Send one `generateContent` request and decode its JSON answer as `T`.
    async fn generate<T: DeserializeOwned>(
        &self,
        parts: Vec<Value>,
        schema: Value,
        system_instruction: &str,
    ) -> Result<T, AiError> {
        let key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;
        let body = json!({
            "contents": [{ "parts": parts }],
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        tracing::debug!(model = %self.model, "sending generateContent request");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "generateContent request failed");
            return Err(AiError::Status(status.as_u16()));
        }

        let payload: Value = response.json().await?;
        let text = response_text(&payload).ok_or(AiError::EmptyResponse)?;
        Ok(serde_json::from_str(extract_json(text))?)
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    async fn analyze(&self, text: &str, images: &[String]) -> Result<AnalysisResult, AiError> {
        let mut result: AnalysisResult = self
            .generate(
                analysis_parts(text, images),
                analysis_schema(),
                ANALYSIS_SYSTEM_INSTRUCTION,
            )
            .await?;
        if result.extracted_content.trim().is_empty() {
            result.extracted_content = text.to_string();
        }
        tracing::info!(title = %result.title_suggestion, "analysis complete");
        Ok(result)
    }
}

#[async_trait]
impl PracticeService for GeminiClient {
    async fn generate_challenge(&self, context: &str) -> Result<PracticeChallenge, AiError> {
        let prompt = format!(
            "Write ONE short practice question that tests understanding of the material below. \
            If the material is about commands or code, ask for a command or snippet and set \
            contextType to \"code\"; otherwise ask a conceptual question and set contextType \
            to \"concept\".\n\nMaterial:\n{}",
            context
        );
        self.generate(
            vec![json!({ "text": prompt })],
            challenge_schema(),
            PRACTICE_SYSTEM_INSTRUCTION,
        )
        .await
    }

    async fn evaluate(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<EvaluationResult, AiError> {
        let prompt = format!(
            "Grade the student's answer using the reference material. Give a score from 0 to \
            100, say whether it is correct, explain briefly and provide the correct \
            solution.\n\nMaterial:\n{}\n\nQuestion:\n{}\n\nStudent answer:\n{}",
            context, question, answer
        );
        self.generate(
            vec![json!({ "text": prompt })],
            evaluation_schema(),
            PRACTICE_SYSTEM_INSTRUCTION,
        )
        .await
    }
}

/// The text of the first candidate part, if any.
fn response_text(payload: &Value) -> Option<&str> {
    payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|t| !t.trim().is_empty())
}

/// Cut the JSON object out of a response that may carry prose or fences.
fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    }
}

fn analysis_parts(text: &str, images: &[String]) -> Vec<Value> {
    let mut parts = vec![json!({
        "text": format!(
            "Analyze the following technical content (notes and/or screenshots) about software \
            or systems. Structure it as a knowledge base entry. If it describes a process, \
            produce a mermaid flowchart. Put any code or commands into codeSnippets and \
            transcribe the text found in images into extractedContent.\n\nContent:\n{}",
            text
        )
    })];

    for image in images {
        match parse_data_url(image) {
            Some(payload) => parts.push(json!({
                "inlineData": { "mimeType": payload.mime_type, "data": payload.data }
            })),
            None => tracing::warn!("skipping image that is not a base64 data URL"),
        }
    }

    parts
}

fn analysis_schema() -> Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING", "description": "A concise, professional summary." },
            "steps": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Ordered steps if the content is a procedure; empty otherwise."
            },
            "codeSnippets": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "language": { "type": "STRING" },
                        "code": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["language", "code", "description"]
                }
            },
            "mermaidChart": {
                "type": "STRING",
                "description": "Valid mermaid source without markdown fences; empty if not applicable."
            },
            "suggestedTags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Up to 5 relevant technical tags."
            },
            "suggestedCategory": { "type": "STRING", "enum": categories },
            "titleSuggestion": { "type": "STRING", "description": "A short descriptive title." },
            "extractedContent": { "type": "STRING" }
        },
        "required": ["summary", "steps", "suggestedTags", "suggestedCategory", "titleSuggestion"]
    })
}

fn challenge_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "contextType": { "type": "STRING", "enum": ["code", "concept"] }
        },
        "required": ["question", "contextType"]
    })
}

fn evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isCorrect": { "type": "BOOLEAN" },
            "score": { "type": "NUMBER" },
            "feedback": { "type": "STRING" },
            "correctSolution": { "type": "STRING" }
        },
        "required": ["isCorrect", "score", "feedback", "correctSolution"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingAnalyzer;

    #[async_trait]
    impl AnalysisService for FailingAnalyzer {
        async fn analyze(&self, _text: &str, _images: &[String]) -> Result<AnalysisResult, AiError> {
            Err(AiError::Status(503))
        }
    }

    fn offline_client(api_key: Option<String>) -> GeminiClient {
        GeminiClient::new(
            Url::parse("https://example.invalid/").unwrap(),
            "gemini-2.5-flash",
            api_key,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_analysis_failure_uses_fallback() {
        let result = analyze_or_fallback(&FailingAnalyzer, "my notes", &[]).await;
        assert_eq!(result, AnalysisResult::fallback("my notes"));
        assert_eq!(result.suggested_tags, vec!["Uncategorized".to_string()]);
        assert_eq!(result.title_suggestion, "New Entry");
        assert_eq!(result.extracted_content, "my notes");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = offline_client(None);
        let err = client.analyze("notes", &[]).await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
        let err = client.generate_challenge("ctx").await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            offline_client(None).endpoint(),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_parse_data_url() {
        let payload = parse_data_url("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.data, "aGVsbG8=");

        let bare = parse_data_url("aGVsbG8=").unwrap();
        assert_eq!(bare.mime_type, "image/png");

        let no_mime = parse_data_url("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(no_mime.mime_type, "image/png");

        assert!(parse_data_url("data:image/png;base64,@@not base64@@").is_none());
        assert!(parse_data_url("data:image/png;base64").is_none());
        assert!(parse_data_url("").is_none());
    }

    #[test]
    fn test_data_url_encoding() {
        let url = to_data_url("image/webp", b"hello");
        assert_eq!(url, "data:image/webp;base64,aGVsbG8=");
        assert_eq!(parse_data_url(&url).unwrap().mime_type, "image/webp");
    }

    #[test]
    fn test_analysis_parts_skip_invalid_images() {
        let images = vec![
            "data:image/png;base64,aGVsbG8=".to_string(),
            "not an image".to_string(),
        ];
        let parts = analysis_parts("notes", &images);
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().ends_with("Content:\nnotes"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn test_response_text_and_json_extraction() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "```json\n{\"question\": \"q\", \"contextType\": \"code\"}\n```" }] } }]
        });
        let text = response_text(&payload).unwrap();
        let challenge: PracticeChallenge = serde_json::from_str(extract_json(text)).unwrap();
        assert_eq!(challenge.question, "q");

        assert!(response_text(&json!({ "candidates": [] })).is_none());
        assert!(response_text(&json!({})).is_none());
    }

    #[test]
    fn test_schema_lists_every_category() {
        let schema = analysis_schema();
        let values = schema["properties"]["suggestedCategory"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(values.len(), Category::ALL.len());
        assert!(values.contains(&json!("Troubleshooting")));
    }
}
