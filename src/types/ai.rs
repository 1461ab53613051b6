use serde::{Deserialize, Serialize};

/// Glyph used when emoji generation fails.
pub const FALLBACK_EMOJI: &str = "🔖";

/// Answer shown when the library question could not be processed.
pub const ASK_LIBRARY_FALLBACK: &str =
    "Sorry, I encountered an error while analyzing your library.";

/// Answer shown when the model replied with nothing.
pub const EMPTY_ANSWER_FALLBACK: &str = "I couldn't find an answer in your library.";

/// Categories the analysis prompt may choose from.
pub const ANALYSIS_CATEGORIES: [&str; 9] = [
    "Design",
    "Development",
    "Marketing",
    "Business",
    "News",
    "Tools",
    "Inspiration",
    "Research",
    "Other",
];

/// Metadata suggested for a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIAnalysisResult {
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl AIAnalysisResult {
    /// Placeholder metadata used when analysis is unavailable.
    pub fn fallback(url: &str) -> Self {
        Self {
            title: url.to_string(),
            summary: "Could not generate summary.".to_string(),
            categories: vec!["Other".to_string()],
            tags: vec!["uncategorized".to_string()],
        }
    }
}

/// Fields the emoji picker looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiRequest {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub url: String,
}
