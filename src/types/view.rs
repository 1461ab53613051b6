use serde::{Deserialize, Serialize};

/// Label used for the "no category filter" choice.
pub const ALL_CATEGORIES: &str = "All";

/// Grid or list presentation of the bookmark collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    /// Only "list" selects the list view; everything else falls back to grid.
    pub fn parse_lenient(value: &str) -> Self {
        if value == "list" {
            ViewMode::List
        } else {
            ViewMode::Grid
        }
    }
}

/// Which bookmarks are visible.
///
/// Category, project, tag and favorites-only are mutually exclusive axes:
/// selecting one clears the other three. The free-text query composes with
/// whichever axis is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_query: String,
    /// `None` means "All".
    pub active_category: Option<String>,
    pub active_project: Option<String>,
    pub active_tag: Option<String>,
    pub favorites_only: bool,
    pub view_mode: ViewMode,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_axes(&mut self) {
        self.active_category = None;
        self.active_project = None;
        self.active_tag = None;
        self.favorites_only = false;
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    /// Selects a category; `"All"` clears the category axis.
    pub fn select_category(&mut self, category: &str) {
        self.clear_axes();
        if category != ALL_CATEGORIES {
            self.active_category = Some(category.to_string());
        }
    }

    pub fn select_project(&mut self, project_id: &str) {
        self.clear_axes();
        self.active_project = Some(project_id.to_string());
    }

    /// Selecting the already-active tag turns the tag filter off.
    pub fn select_tag(&mut self, tag: &str) {
        if self.active_tag.as_deref() == Some(tag) {
            self.active_tag = None;
            return;
        }
        self.set_tag(tag);
    }

    /// Activates a tag without the toggle-off behaviour of `select_tag`.
    pub fn set_tag(&mut self, tag: &str) {
        self.clear_axes();
        self.active_tag = Some(tag.to_string());
    }

    /// Turning favorites-only on clears the other axes; turning it off
    /// leaves them alone.
    pub fn set_favorites_only(&mut self, enabled: bool) {
        if enabled {
            self.clear_axes();
        }
        self.favorites_only = enabled;
    }

    pub fn toggle_favorites_only(&mut self) {
        let next = !self.favorites_only;
        self.set_favorites_only(next);
    }

    pub fn clear_project(&mut self) {
        self.active_project = None;
    }

    /// Category label for display, `"All"` when no category is active.
    pub fn category_label(&self) -> &str {
        self.active_category.as_deref().unwrap_or(ALL_CATEGORIES)
    }
}

/// Number of bookmarks filed under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Number of bookmarks carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// A project together with how many bookmarks reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCount {
    pub id: String,
    pub name: String,
    pub color: String,
    pub count: usize,
}

/// Library-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub bookmarks: usize,
    pub favorites: usize,
    pub projects: usize,
    pub categories: usize,
}

/// Per-project dashboard numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDashboard {
    pub total: usize,
    pub favorites: usize,
    pub top_tags: Vec<String>,
}
