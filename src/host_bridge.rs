//! Channel between the library and a native host shell.
//!
//! Inbound, the host sends small `{type, value}` commands that adjust the
//! view or open the add-bookmark form. Anything unrecognized is ignored.
//! Outbound, the library publishes a `stateChanged` status whenever the
//! section title or the counts change. Nobody listening is fine.

use serde::Serialize;
use serde_json::Value;

use crate::managers::library_manager::{Library, LibraryManagerTrait};
use crate::services::view_state;
use crate::types::state::ThemePreference;
use crate::types::view::{ProjectCount, StatsSummary, ViewMode};

pub const STATE_CHANGED: &str = "stateChanged";

/// Filter fields the host may set. Applied in field order; each present
/// field is an axis selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub favorites_only: Option<bool>,
    pub category: Option<String>,
    pub project_id: Option<String>,
    pub tag: Option<String>,
}

/// A decoded host message. Built only by [`parse_command`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    SetSearchQuery(String),
    SetViewMode(ViewMode),
    SetFilter(FilterUpdate),
    SetTheme(ThemePreference),
    OpenAddBookmark,
}

/// Something the host asked for that the library cannot do by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEffect {
    None,
    OpenAddBookmark,
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Reads a host message. Unknown types and unusable payloads yield `None`;
/// fields of the wrong type inside a filter update are skipped.
pub fn parse_command(message: &Value) -> Option<HostCommand> {
    let kind = message.get("type")?.as_str()?;
    let value = message.get("value").unwrap_or(&Value::Null);

    match kind {
        "setSearchQuery" => {
            let query = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(HostCommand::SetSearchQuery(query))
        }
        "setViewMode" => Some(HostCommand::SetViewMode(ViewMode::parse_lenient(
            value.as_str().unwrap_or_default(),
        ))),
        "setFilter" => Some(HostCommand::SetFilter(FilterUpdate {
            favorites_only: value.get("favoritesOnly").and_then(Value::as_bool),
            category: string_field(value, "category"),
            project_id: string_field(value, "projectId"),
            tag: string_field(value, "tag"),
        })),
        "setTheme" => value
            .as_str()
            .and_then(ThemePreference::parse)
            .map(HostCommand::SetTheme),
        "openAddBookmark" => Some(HostCommand::OpenAddBookmark),
        _ => None,
    }
}

pub fn apply_command(library: &mut Library, command: HostCommand) -> HostEffect {
    match command {
        HostCommand::SetSearchQuery(query) => library.filter_mut().set_search_query(&query),
        HostCommand::SetViewMode(mode) => library.filter_mut().view_mode = mode,
        HostCommand::SetFilter(update) => {
            let filter = library.filter_mut();
            if let Some(enabled) = update.favorites_only {
                filter.set_favorites_only(enabled);
            }
            if let Some(category) = &update.category {
                filter.select_category(category);
            }
            if let Some(project_id) = &update.project_id {
                filter.select_project(project_id);
            }
            if let Some(tag) = &update.tag {
                filter.set_tag(tag);
            }
        }
        HostCommand::SetTheme(theme) => {
            library.set_theme(theme);
        }
        HostCommand::OpenAddBookmark => return HostEffect::OpenAddBookmark,
    }
    HostEffect::None
}

/// The `stateChanged` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostStatus {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub counts: StatsSummary,
    pub projects: Vec<ProjectCount>,
}

impl HostStatus {
    pub fn from_library(library: &Library) -> Self {
        let state = library.state();
        Self {
            kind: STATE_CHANGED,
            title: view_state::section_title(library.filter(), &state.projects),
            counts: view_state::stats_summary(state),
            projects: view_state::project_stats(&state.projects, &state.bookmarks),
        }
    }
}

/// Receives outbound host messages.
pub trait HostSink {
    fn post(&self, payload: &Value);
}

impl<F: Fn(&Value)> HostSink for F {
    fn post(&self, payload: &Value) {
        self(payload)
    }
}

/// Publishes a status only when it differs from the last one published.
#[derive(Default)]
pub struct StatusEmitter {
    sink: Option<Box<dyn HostSink>>,
    last: Option<HostStatus>,
}

impl StatusEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Box<dyn HostSink>) -> Self {
        Self {
            sink: Some(sink),
            last: None,
        }
    }

    /// Returns the payload when it was new, after handing it to the sink.
    pub fn publish(&mut self, status: HostStatus) -> Option<Value> {
        if self.last.as_ref() == Some(&status) {
            return None;
        }
        let payload = match serde_json::to_value(&status) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("host status not serializable: {}", e);
                return None;
            }
        };
        if let Some(sink) = &self.sink {
            sink.post(&payload);
        }
        self.last = Some(status);
        Some(payload)
    }
}
