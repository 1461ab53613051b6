//! Library Manager for NeuroMark.
//!
//! Implements `LibraryManagerTrait`: the single mutation API over the user's
//! bookmarks, projects, categories and theme. The library owns the only live
//! copy of the state; every change is written through to the local store
//! for the collections it touched before the call returns.

use uuid::Uuid;

use crate::services::local_store::{LocalStore, LocalStoreTrait};
use crate::services::seed_data;
use crate::types::bookmark::{Bookmark, BookmarkDraft, Project, ProjectUpdate};
use crate::types::errors::LibraryError;
use crate::types::state::{FullState, ThemePreference};
use crate::types::view::FilterState;

pub const DELETE_BOOKMARK_PROMPT: &str = "Are you sure you want to delete this bookmark?";
pub const DELETE_PROJECT_PROMPT: &str =
    "Delete this project? Bookmarks will remain but will be unlinked.";

pub fn delete_category_prompt(name: &str) -> String {
    format!(
        "Delete category \"{}\"? Bookmarks will remain but be untagged from this category.",
        name
    )
}

/// Asks the user to approve a destructive operation.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Trait defining library mutation operations.
///
/// Updates and deletions return `Ok(true)` when state changed and `Ok(false)`
/// for a no-op, including a declined confirmation. The toggles instead
/// return the flag's new value.
pub trait LibraryManagerTrait {
    fn add_bookmark(&mut self, draft: BookmarkDraft) -> Result<String, LibraryError>;
    fn update_bookmark(&mut self, id: &str, draft: BookmarkDraft) -> Result<bool, LibraryError>;
    fn delete_bookmark(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, LibraryError>;
    fn toggle_favorite(&mut self, id: &str) -> Result<bool, LibraryError>;
    fn toggle_pin(&mut self, id: &str) -> Result<bool, LibraryError>;
    fn toggle_project(&mut self, bookmark_id: &str, project_id: &str) -> Result<bool, LibraryError>;
    fn set_project_context(&mut self, bookmark_id: &str, project_id: &str, context: &str) -> Result<bool, LibraryError>;

    fn add_category(&mut self, name: &str) -> bool;
    fn rename_category(&mut self, old_name: &str, new_name: &str) -> bool;
    fn delete_category(&mut self, name: &str, confirm: &dyn Confirm) -> bool;

    fn add_project(&mut self, name: &str, color: &str) -> Result<String, LibraryError>;
    fn update_project(&mut self, id: &str, update: &ProjectUpdate) -> Result<bool, LibraryError>;
    fn delete_project(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, LibraryError>;

    fn set_theme(&mut self, theme: ThemePreference) -> bool;
    fn toggle_theme(&mut self) -> ThemePreference;

    /// Replaces the whole state, e.g. with a merge result.
    fn replace_state(&mut self, state: FullState);
}

/// The application-state object: library contents plus the view filter.
pub struct Library {
    state: FullState,
    filter: FilterState,
    store: LocalStore,
    changed: bool,
}

impl Library {
    /// Loads the library from the store, falling back per key to the defaults.
    pub fn load(store: LocalStore) -> Self {
        let state = store.load_state();
        tracing::debug!(
            bookmarks = state.bookmarks.len(),
            projects = state.projects.len(),
            categories = state.categories.len(),
            "library loaded"
        );
        Self::with_state(state, store)
    }

    /// Starts from an explicit state without reading the store.
    pub fn with_state(state: FullState, store: LocalStore) -> Self {
        Self {
            state,
            filter: FilterState::new(),
            store,
            changed: false,
        }
    }

    pub fn state(&self) -> &FullState {
        &self.state
    }

    /// A by-value copy for merge and sync.
    pub fn snapshot(&self) -> FullState {
        self.state.clone()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.state.bookmarks
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn categories(&self) -> &[String] {
        &self.state.categories
    }

    pub fn theme(&self) -> ThemePreference {
        self.state.theme
    }

    pub fn get_bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.state.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn get_project(&self, id: &str) -> Option<&Project> {
        self.state.projects.iter().find(|p| p.id == id)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    /// Returns whether state changed since the last call, and resets the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    fn bookmark_mut(&mut self, id: &str) -> Result<&mut Bookmark, LibraryError> {
        self.state
            .bookmarks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| LibraryError::BookmarkNotFound(id.to_string()))
    }

    fn persist_bookmarks(&mut self) {
        self.store.save_bookmarks(&self.state.bookmarks);
        self.changed = true;
    }

    fn persist_categories(&mut self) {
        self.store.save_categories(&self.state.categories);
        self.changed = true;
    }

    fn persist_projects(&mut self) {
        self.store.save_projects(&self.state.projects);
        self.changed = true;
    }

    /// Adds any draft categories missing from the global list.
    fn absorb_categories(&mut self, categories: &[String]) {
        let mut added = false;
        for category in categories {
            if !category.is_empty() && !self.state.categories.contains(category) {
                self.state.categories.push(category.clone());
                added = true;
            }
        }
        if added {
            self.state.categories.sort();
            self.persist_categories();
        }
    }
}

impl LibraryManagerTrait for Library {
    /// Adds a new bookmark at the front of the collection. Returns its id.
    ///
    /// A draft without projects joins the project currently being viewed.
    fn add_bookmark(&mut self, mut draft: BookmarkDraft) -> Result<String, LibraryError> {
        if draft.url.trim().is_empty() {
            return Err(LibraryError::InvalidInput("url must not be empty".to_string()));
        }
        if draft.project_ids.is_empty() {
            if let Some(active) = &self.filter.active_project {
                draft.project_ids.push(active.clone());
            }
        }

        let categories = draft.categories.clone();
        let id = Uuid::new_v4().to_string();
        let bookmark = draft.into_bookmark(id.clone(), seed_data::now_millis());
        self.state.bookmarks.insert(0, bookmark);
        self.persist_bookmarks();
        self.absorb_categories(&categories);

        tracing::debug!("bookmark {} added", id);
        Ok(id)
    }

    /// Overwrites the editable fields; id, creation time and flags are kept.
    fn update_bookmark(&mut self, id: &str, draft: BookmarkDraft) -> Result<bool, LibraryError> {
        if draft.url.trim().is_empty() {
            return Err(LibraryError::InvalidInput("url must not be empty".to_string()));
        }
        let categories = draft.categories.clone();
        let bookmark = self.bookmark_mut(id)?;
        let before = bookmark.clone();
        draft.apply_to(bookmark);
        let changed = *bookmark != before;
        if changed {
            self.persist_bookmarks();
        }
        self.absorb_categories(&categories);
        Ok(changed)
    }

    fn delete_bookmark(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, LibraryError> {
        if self.get_bookmark(id).is_none() {
            return Err(LibraryError::BookmarkNotFound(id.to_string()));
        }
        if !confirm.confirm(DELETE_BOOKMARK_PROMPT) {
            return Ok(false);
        }
        self.state.bookmarks.retain(|b| b.id != id);
        self.persist_bookmarks();
        Ok(true)
    }

    fn toggle_favorite(&mut self, id: &str) -> Result<bool, LibraryError> {
        let bookmark = self.bookmark_mut(id)?;
        bookmark.is_favorite = !bookmark.is_favorite;
        let now = bookmark.is_favorite;
        self.persist_bookmarks();
        Ok(now)
    }

    fn toggle_pin(&mut self, id: &str) -> Result<bool, LibraryError> {
        let bookmark = self.bookmark_mut(id)?;
        bookmark.is_pinned = !bookmark.is_pinned;
        let now = bookmark.is_pinned;
        self.persist_bookmarks();
        Ok(now)
    }

    /// Adds or removes one project association. Removing also drops the
    /// context annotation, so re-adding starts with no context.
    ///
    /// Returns whether the bookmark is now associated with the project.
    fn toggle_project(&mut self, bookmark_id: &str, project_id: &str) -> Result<bool, LibraryError> {
        let project_known = self.get_project(project_id).is_some();
        let bookmark = self.bookmark_mut(bookmark_id)?;
        let associated = if bookmark.has_project(project_id) {
            bookmark.remove_project(project_id);
            false
        } else {
            if !project_known {
                return Err(LibraryError::ProjectNotFound(project_id.to_string()));
            }
            bookmark.add_project(project_id);
            true
        };
        self.persist_bookmarks();
        Ok(associated)
    }

    /// Sets why a bookmark matters to one of its projects. Empty text clears it.
    fn set_project_context(&mut self, bookmark_id: &str, project_id: &str, context: &str) -> Result<bool, LibraryError> {
        let bookmark = self.bookmark_mut(bookmark_id)?;
        if !bookmark.has_project(project_id) {
            return Err(LibraryError::InvalidInput(format!(
                "bookmark {} is not linked to project {}",
                bookmark_id, project_id
            )));
        }
        let trimmed = context.trim();
        let changed = if trimmed.is_empty() {
            bookmark.project_contexts.remove(project_id).is_some()
        } else {
            bookmark.project_contexts.insert(project_id.to_string(), trimmed.to_string())
                != Some(trimmed.to_string())
        };
        if changed {
            self.persist_bookmarks();
        }
        Ok(changed)
    }

    fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.state.categories.iter().any(|c| c == name) {
            return false;
        }
        self.state.categories.push(name.to_string());
        self.state.categories.sort();
        self.persist_categories();
        true
    }

    /// Renames a category everywhere. Ignored when the new name is empty or
    /// already taken.
    fn rename_category(&mut self, old_name: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() || self.state.categories.iter().any(|c| c == new_name) {
            return false;
        }
        if !self.state.categories.iter().any(|c| c == old_name) {
            return false;
        }

        for c in self.state.categories.iter_mut() {
            if c == old_name {
                *c = new_name.to_string();
            }
        }
        self.state.categories.sort();
        self.persist_categories();

        for bookmark in self.state.bookmarks.iter_mut() {
            bookmark.rename_category(old_name, new_name);
        }
        self.persist_bookmarks();

        if self.filter.active_category.as_deref() == Some(old_name) {
            self.filter.active_category = Some(new_name.to_string());
        }
        true
    }

    /// Removes a category from the list and from every bookmark. Bookmarks
    /// are never deleted, even when left without categories.
    fn delete_category(&mut self, name: &str, confirm: &dyn Confirm) -> bool {
        let listed = self.state.categories.iter().any(|c| c == name);
        let referenced = self.state.bookmarks.iter().any(|b| b.has_category(name));
        if !listed && !referenced {
            return false;
        }
        if !confirm.confirm(&delete_category_prompt(name)) {
            return false;
        }

        if listed {
            self.state.categories.retain(|c| c != name);
            self.persist_categories();
        }
        if referenced {
            for bookmark in self.state.bookmarks.iter_mut() {
                bookmark.remove_category(name);
            }
            self.persist_bookmarks();
        }
        if self.filter.active_category.as_deref() == Some(name) {
            self.filter.active_category = None;
        }
        true
    }

    fn add_project(&mut self, name: &str, color: &str) -> Result<String, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidInput("project name must not be empty".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        self.state.projects.push(Project {
            id: id.clone(),
            name: name.to_string(),
            color: color.to_string(),
            description: Some(String::new()),
        });
        self.persist_projects();
        Ok(id)
    }

    fn update_project(&mut self, id: &str, update: &ProjectUpdate) -> Result<bool, LibraryError> {
        let project = self
            .state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LibraryError::ProjectNotFound(id.to_string()))?;
        let before = project.clone();
        update.apply_to(project);
        let changed = *project != before;
        if changed {
            self.persist_projects();
        }
        Ok(changed)
    }

    /// Deletes a project and unlinks it from every bookmark.
    fn delete_project(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, LibraryError> {
        if self.get_project(id).is_none() {
            return Err(LibraryError::ProjectNotFound(id.to_string()));
        }
        if !confirm.confirm(DELETE_PROJECT_PROMPT) {
            return Ok(false);
        }

        self.state.projects.retain(|p| p.id != id);
        self.persist_projects();

        for bookmark in self.state.bookmarks.iter_mut() {
            bookmark.remove_project(id);
        }
        self.persist_bookmarks();

        if self.filter.active_project.as_deref() == Some(id) {
            self.filter.clear_project();
        }
        Ok(true)
    }

    fn set_theme(&mut self, theme: ThemePreference) -> bool {
        if self.state.theme == theme {
            return false;
        }
        self.state.theme = theme;
        self.store.save_theme(theme);
        self.changed = true;
        true
    }

    fn toggle_theme(&mut self) -> ThemePreference {
        let next = self.state.theme.toggled();
        self.set_theme(next);
        next
    }

    fn replace_state(&mut self, state: FullState) {
        self.state = state;
        self.store.save_state(&self.state);
        self.changed = true;
    }
}
