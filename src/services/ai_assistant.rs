//! AI Assistant for NeuroMark.
//!
//! Suggests bookmark metadata, picks an emoji for a bookmark and answers
//! questions about the library through the Gemini `generateContent` API.
//! Prompt construction and response parsing are plain functions so they can
//! be tested without the network. Callers decide on fallbacks.

use std::future::Future;

use serde_json::{json, Value};

use crate::types::ai::{AIAnalysisResult, EmojiRequest, ANALYSIS_CATEGORIES};
use crate::types::bookmark::Bookmark;
use crate::types::errors::AIError;
use crate::types::settings::AISettings;

/// Maximum number of bookmarks included in a library question.
pub const LIBRARY_CONTEXT_LIMIT: usize = 60;

/// Trait defining AI assistant operations.
pub trait AIAssistantTrait {
    fn analyze_bookmark(&self, url: &str, notes: &str) -> impl Future<Output = Result<AIAnalysisResult, AIError>> + Send;
    fn generate_emoji(&self, request: &EmojiRequest) -> impl Future<Output = Result<String, AIError>> + Send;
    fn ask_library(&self, query: &str, bookmarks: &[Bookmark]) -> impl Future<Output = Result<String, AIError>> + Send;
}

pub fn analysis_prompt(url: &str, notes: &str) -> String {
    format!(
        "Analyze the following website information to create a bookmark entry.\n\
         URL: {url}\n\
         User Notes/Context: {notes}\n\
         \n\
         Task:\n\
         1. Generate a concise, professional title (max 60 chars).\n\
         2. Write a brief executive summary (max 150 chars).\n\
         3. Select ALL applicable categories from this list: [{categories}]. Return at least 1, max 3.\n\
         4. Generate 3-5 relevant, short tags (lowercase).\n\
         \n\
         Return JSON only.",
        url = url,
        notes = notes,
        categories = ANALYSIS_CATEGORIES.join(", "),
    )
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "A concise title for the bookmark" },
            "summary": { "type": "STRING", "description": "A short summary of what the link is about" },
            "categories": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of applicable categories (1-3 items)"
            },
            "tags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of relevant tags"
            }
        },
        "required": ["title", "summary", "categories", "tags"]
    })
}

pub fn emoji_prompt(request: &EmojiRequest) -> String {
    format!(
        "Choose a single emoji that best represents the bookmark.\n\
         Title: {}\n\
         Summary: {}\n\
         Tags: {}\n\
         URL: {}\n\
         \n\
         Requirements:\n\
         - Return exactly one emoji.\n\
         - No text, no punctuation, no extra characters.",
        request.title,
        request.summary,
        request.tags.join(", "),
        request.url,
    )
}

fn emoji_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "emoji": { "type": "STRING", "description": "A single emoji character" }
        },
        "required": ["emoji"]
    })
}

/// One block per bookmark, at most [`LIBRARY_CONTEXT_LIMIT`] of them.
pub fn library_context(bookmarks: &[Bookmark]) -> String {
    bookmarks
        .iter()
        .take(LIBRARY_CONTEXT_LIMIT)
        .map(|b| {
            format!(
                "- Title: {}\n  Summary: {}\n  Tags: {}\n  URL: {}",
                b.title,
                b.summary,
                b.tags.join(", "),
                b.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn ask_library_prompt(query: &str, bookmarks: &[Bookmark]) -> String {
    format!(
        "You are an intelligent knowledge assistant. The user is asking a question about their bookmark library.\n\
         \n\
         User Query: \"{query}\"\n\
         \n\
         Below is the content of the user's library (first {limit} items):\n\
         {context}\n\
         \n\
         Instructions:\n\
         1. Answer the user's question using ONLY the provided library content.\n\
         2. If the answer is found, cite the specific bookmark titles.\n\
         3. If the answer is not in the library, state that clearly.\n\
         4. Keep the response concise, professional, and helpful (max 3-4 sentences).\n\
         5. Do not use markdown formatting like bold or headers, just plain text with simple newlines.",
        query = query,
        limit = LIBRARY_CONTEXT_LIMIT,
        context = library_context(bookmarks),
    )
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(response: &Value) -> Result<String, AIError> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or(AIError::EmptyResponse)?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(AIError::EmptyResponse);
    }
    Ok(text)
}

pub fn parse_analysis(text: &str) -> Result<AIAnalysisResult, AIError> {
    serde_json::from_str(text).map_err(|e| AIError::InvalidResponse(e.to_string()))
}

/// First character of the trimmed `emoji` field.
pub fn parse_emoji(text: &str) -> Result<String, AIError> {
    let value: Value = serde_json::from_str(text).map_err(|e| AIError::InvalidResponse(e.to_string()))?;
    value
        .get("emoji")
        .and_then(Value::as_str)
        .and_then(|raw| raw.trim().chars().next())
        .map(|c| c.to_string())
        .ok_or(AIError::EmptyResponse)
}

/// AI assistant backed by the Gemini REST API.
pub struct GeminiAssistant {
    client: reqwest::Client,
    settings: AISettings,
}

impl GeminiAssistant {
    pub fn new(settings: AISettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn api_key(&self) -> Result<&str, AIError> {
        match self.settings.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AIError::MissingApiKey),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// Sends one prompt. With a schema the reply is constrained to JSON.
    async fn generate(&self, prompt: String, schema: Option<Value>) -> Result<String, AIError> {
        let key = self.api_key()?;
        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        if let Some(schema) = schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AIError::RequestFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AIError::RequestFailed(format!("{} {}", status.as_u16(), detail.trim())));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AIError::InvalidResponse(e.to_string()))?;
        extract_text(&payload)
    }
}

impl AIAssistantTrait for GeminiAssistant {
    async fn analyze_bookmark(&self, url: &str, notes: &str) -> Result<AIAnalysisResult, AIError> {
        let text = self.generate(analysis_prompt(url, notes), Some(analysis_schema())).await?;
        parse_analysis(&text)
    }

    async fn generate_emoji(&self, request: &EmojiRequest) -> Result<String, AIError> {
        let text = self.generate(emoji_prompt(request), Some(emoji_schema())).await?;
        parse_emoji(&text)
    }

    async fn ask_library(&self, query: &str, bookmarks: &[Bookmark]) -> Result<String, AIError> {
        self.generate(ask_library_prompt(query, bookmarks), None).await
    }
}
