use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, Project};

/// Version tag written into every remote state document.
pub const CLOUD_STATE_VERSION: u32 = 1;

/// Global appearance preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the operating system.
    #[default]
    Auto,
}

impl ThemePreference {
    /// Parses the wire value. Anything but the three known values is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "auto" => Some(ThemePreference::Auto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::Auto => "auto",
        }
    }

    /// The manual toggle flips between light and dark; auto resolves to light.
    pub fn toggled(&self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark | ThemePreference::Auto => ThemePreference::Light,
        }
    }
}

/// The complete user library: the unit persisted locally and synced remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullState {
    pub bookmarks: Vec<Bookmark>,
    pub projects: Vec<Project>,
    pub categories: Vec<String>,
    pub theme: ThemePreference,
}

/// Remote state document, schema version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudState {
    pub version: u32,
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<String>,
    pub projects: Vec<Project>,
    /// `None` when the stored document carried no usable theme.
    pub theme: Option<ThemePreference>,
}

impl CloudState {
    /// Wraps a local snapshot for upload.
    pub fn from_state(state: &FullState) -> Self {
        Self {
            version: CLOUD_STATE_VERSION,
            bookmarks: state.bookmarks.clone(),
            categories: state.categories.clone(),
            projects: state.projects.clone(),
            theme: Some(state.theme),
        }
    }
}
