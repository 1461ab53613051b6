//! Merge engine for reconciling a local library with a remote snapshot.
//!
//! The only conflict rule is "first authority wins": every entity of the
//! primary collection is kept as is, and the secondary collection only
//! contributes entities whose id the primary does not have. Results keep
//! primary order, followed by the secondary's additions in their order.

use std::collections::HashSet;

use crate::services::seed_data;
use crate::types::bookmark::Identified;
use crate::types::state::{CloudState, FullState};

/// A rule for combining two collections of the same entity type.
pub trait MergePolicy {
    fn merge_entities<T: Identified + Clone>(&self, primary: &[T], secondary: &[T]) -> Vec<T>;
    fn merge_strings(&self, primary: &[String], secondary: &[String]) -> Vec<String>;
}

/// The primary side wins every id collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAuthority;

impl MergePolicy for FirstAuthority {
    fn merge_entities<T: Identified + Clone>(&self, primary: &[T], secondary: &[T]) -> Vec<T> {
        merge_by_id(primary, secondary)
    }

    fn merge_strings(&self, primary: &[String], secondary: &[String]) -> Vec<String> {
        merge_unique(primary, secondary)
    }
}

/// Union by id; the primary copy is kept on collision.
pub fn merge_by_id<T: Identified + Clone>(primary: &[T], secondary: &[T]) -> Vec<T> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(primary.len() + secondary.len());
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    for item in primary.iter().chain(secondary.iter()) {
        if seen.insert(item.id()) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Order-preserving dedupe of two string lists, primary first.
pub fn merge_unique(primary: &[String], secondary: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    primary
        .iter()
        .chain(secondary.iter())
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// Merges two collections with the primary side as the authority.
pub fn resolve_by_first_authority<T: Identified + Clone>(primary: &[T], secondary: &[T]) -> Vec<T> {
    FirstAuthority.merge_entities(primary, secondary)
}

/// Reconciles a fetched remote document with the local library.
///
/// Remote is primary for all three collections. The remote theme is adopted
/// when it decoded to a valid value, otherwise the local theme stays. An
/// empty merged category list is replaced by the default categories.
pub fn merge_full_state<P: MergePolicy>(policy: &P, remote: &CloudState, local: &FullState) -> FullState {
    let bookmarks = policy.merge_entities(&remote.bookmarks, &local.bookmarks);
    let projects = policy.merge_entities(&remote.projects, &local.projects);
    let mut categories = policy.merge_strings(&remote.categories, &local.categories);
    if categories.is_empty() {
        categories = seed_data::default_categories();
    }
    let theme = remote.theme.unwrap_or(local.theme);

    FullState {
        bookmarks,
        projects,
        categories,
        theme,
    }
}
