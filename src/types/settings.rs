use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub cloud: CloudSettings,
    #[serde(default)]
    pub ai: AISettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Where the local library database lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Directory holding `neuromark.db`. Platform data dir when unset.
    pub data_dir: Option<String>,
}

/// Remote state store connection. Sync is disabled unless both the URL and
/// the anon key are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloudSettings {
    pub supabase_url: Option<String>,
    pub anon_key: Option<String>,
    pub table: String,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            anon_key: None,
            table: "neuromark_state".to_string(),
        }
    }
}

impl CloudSettings {
    pub fn is_configured(&self) -> bool {
        matches!(
            (&self.supabase_url, &self.anon_key),
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty()
        )
    }
}

/// Generative model used for metadata, emoji and library questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AISettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// Quiet period before a local change is pushed to the remote store.
    pub debounce_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { debounce_ms: 800 }
    }
}
