use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Anything with a stable unique id that the merge engine can reconcile.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A user-defined grouping of bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Identified for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update applied to a project. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProjectUpdate {
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
    }
}

/// A saved bookmark in its current persisted shape.
///
/// Field names follow the camelCase wire format shared by local storage and
/// the remote state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub project_ids: Vec<String>,
    /// Project id -> why this bookmark matters to that project.
    /// Every key must also appear in `project_ids`.
    pub project_contexts: BTreeMap<String, String>,
    /// Milliseconds since the UNIX epoch.
    pub created_at: i64,
    pub is_favorite: bool,
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
}

impl Identified for Bookmark {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Bookmark {
    pub fn has_project(&self, project_id: &str) -> bool {
        self.project_ids.iter().any(|p| p == project_id)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Associates the bookmark with a project. Returns false if already present.
    pub fn add_project(&mut self, project_id: &str) -> bool {
        if self.has_project(project_id) {
            return false;
        }
        self.project_ids.push(project_id.to_string());
        true
    }

    /// Drops the association and its context annotation together.
    /// Returns false if the project was not associated.
    pub fn remove_project(&mut self, project_id: &str) -> bool {
        let before = self.project_ids.len();
        self.project_ids.retain(|p| p != project_id);
        self.project_contexts.remove(project_id);
        self.project_ids.len() != before
    }

    /// Removes context entries whose project is no longer associated.
    pub fn prune_project_contexts(&mut self) {
        let ids = &self.project_ids;
        self.project_contexts.retain(|pid, _| ids.iter().any(|p| p == pid));
    }

    pub fn remove_category(&mut self, category: &str) {
        self.categories.retain(|c| c != category);
    }

    pub fn rename_category(&mut self, old_name: &str, new_name: &str) {
        for c in self.categories.iter_mut() {
            if c == old_name {
                *c = new_name.to_string();
            }
        }
    }
}

/// The payload of the add/edit bookmark form.
///
/// Identity, creation time and the favorite/pin flags are owned by the
/// library and never come from a draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub project_contexts: BTreeMap<String, String>,
    #[serde(default)]
    pub icon_emoji: Option<String>,
}

impl BookmarkDraft {
    /// Builds a new bookmark from the draft with the given identity.
    pub fn into_bookmark(self, id: String, created_at: i64) -> Bookmark {
        let mut bookmark = Bookmark {
            id,
            url: self.url,
            title: self.title,
            summary: self.summary,
            categories: self.categories,
            tags: self.tags,
            project_ids: self.project_ids,
            project_contexts: self.project_contexts,
            created_at,
            is_favorite: false,
            is_pinned: false,
            icon_emoji: self.icon_emoji,
        };
        bookmark.prune_project_contexts();
        bookmark
    }

    /// Overwrites the editable fields of an existing bookmark.
    pub fn apply_to(self, bookmark: &mut Bookmark) {
        bookmark.url = self.url;
        bookmark.title = self.title;
        bookmark.summary = self.summary;
        bookmark.categories = self.categories;
        bookmark.tags = self.tags;
        bookmark.project_ids = self.project_ids;
        bookmark.project_contexts = self.project_contexts;
        bookmark.icon_emoji = self.icon_emoji;
        bookmark.prune_project_contexts();
    }
}
