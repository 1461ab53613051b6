//! Derived view state: pure functions of the library and the filter.
//!
//! Nothing here mutates; callers recompute whenever the library or the
//! filter changes.

use std::collections::HashMap;

use crate::types::bookmark::{Bookmark, Project};
use crate::types::state::FullState;
use crate::types::view::{
    CategoryCount, FilterState, ProjectCount, ProjectDashboard, StatsSummary, TagCount,
};

/// Maximum number of tags in the popularity list.
pub const POPULAR_TAG_LIMIT: usize = 15;

/// Number of tags shown on a project dashboard.
pub const DASHBOARD_TAG_LIMIT: usize = 3;

pub const ALL_DOCUMENTS_TITLE: &str = "All Documents";
pub const FAVORITES_TITLE: &str = "Favorites";

/// The five-way AND of the filter predicate.
pub fn matches_filter(bookmark: &Bookmark, filter: &FilterState) -> bool {
    let query = filter.search_query.to_lowercase();
    let matches_search = query.is_empty()
        || bookmark.title.to_lowercase().contains(&query)
        || bookmark.summary.to_lowercase().contains(&query)
        || bookmark.tags.iter().any(|t| t.to_lowercase().contains(&query));

    let matches_category = filter
        .active_category
        .as_deref()
        .map_or(true, |c| bookmark.has_category(c));
    let matches_project = filter
        .active_project
        .as_deref()
        .map_or(true, |p| bookmark.has_project(p));
    let matches_favorite = !filter.favorites_only || bookmark.is_favorite;
    let matches_tag = filter
        .active_tag
        .as_deref()
        .map_or(true, |t| bookmark.has_tag(t));

    matches_search && matches_category && matches_project && matches_favorite && matches_tag
}

pub fn filter_bookmarks<'a>(bookmarks: &'a [Bookmark], filter: &FilterState) -> Vec<&'a Bookmark> {
    bookmarks.iter().filter(|b| matches_filter(b, filter)).collect()
}

/// Pinned first, then newest first. Stable for equal keys.
pub fn sort_bookmarks(bookmarks: &mut [&Bookmark]) {
    bookmarks.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Filtered and ordered, ready to display.
pub fn visible_bookmarks<'a>(bookmarks: &'a [Bookmark], filter: &FilterState) -> Vec<&'a Bookmark> {
    let mut visible = filter_bookmarks(bookmarks, filter);
    sort_bookmarks(&mut visible);
    visible
}

/// Bookmark counts per global category, highest first. Empty categories
/// are left out.
pub fn category_stats(categories: &[String], bookmarks: &[Bookmark]) -> Vec<CategoryCount> {
    let mut stats: Vec<CategoryCount> = categories
        .iter()
        .map(|name| CategoryCount {
            name: name.clone(),
            count: bookmarks.iter().filter(|b| b.has_category(name)).count(),
        })
        .filter(|c| c.count > 0)
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Bookmark counts per project, in project order. Projects without
/// bookmarks are kept with a zero count.
pub fn project_stats(projects: &[Project], bookmarks: &[Bookmark]) -> Vec<ProjectCount> {
    projects
        .iter()
        .map(|p| ProjectCount {
            id: p.id.clone(),
            name: p.name.clone(),
            color: p.color.clone(),
            count: bookmarks.iter().filter(|b| b.has_project(&p.id)).count(),
        })
        .collect()
}

/// Counts tags over the given bookmarks, most used first. Ties keep the
/// order in which tags were first seen.
fn count_tags<'a, I>(bookmarks: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TagCount> = Vec::new();
    for bookmark in bookmarks {
        for tag in &bookmark.tags {
            match index.get(tag.as_str()) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(tag.as_str(), counts.len());
                    counts.push(TagCount {
                        name: tag.clone(),
                        count: 1,
                    });
                }
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn popular_tags(bookmarks: &[Bookmark]) -> Vec<TagCount> {
    let mut tags = count_tags(bookmarks);
    tags.truncate(POPULAR_TAG_LIMIT);
    tags
}

pub fn stats_summary(state: &FullState) -> StatsSummary {
    StatsSummary {
        bookmarks: state.bookmarks.len(),
        favorites: state.bookmarks.iter().filter(|b| b.is_favorite).count(),
        projects: state.projects.len(),
        categories: state.categories.len(),
    }
}

/// Heading for the current view.
///
/// Favorites beats tag, tag beats project, project beats category. An
/// active project that no longer exists falls through to the category.
pub fn section_title(filter: &FilterState, projects: &[Project]) -> String {
    if filter.favorites_only {
        return FAVORITES_TITLE.to_string();
    }
    if let Some(tag) = &filter.active_tag {
        return format!("Tag: {}", tag);
    }
    if let Some(project) = filter
        .active_project
        .as_deref()
        .and_then(|id| projects.iter().find(|p| p.id == id))
    {
        return project.name.clone();
    }
    match &filter.active_category {
        Some(category) => category.clone(),
        None => ALL_DOCUMENTS_TITLE.to_string(),
    }
}

pub fn project_dashboard(project_id: &str, bookmarks: &[Bookmark]) -> ProjectDashboard {
    let members: Vec<&Bookmark> = bookmarks.iter().filter(|b| b.has_project(project_id)).collect();
    let top_tags = count_tags(members.iter().copied())
        .into_iter()
        .take(DASHBOARD_TAG_LIMIT)
        .map(|t| t.name)
        .collect();
    ProjectDashboard {
        total: members.len(),
        favorites: members.iter().filter(|b| b.is_favorite).count(),
        top_tags,
    }
}

/// Bookmarks a library question is answered from: the active project's
/// bookmarks when a project is selected, the whole library otherwise.
pub fn ask_library_scope(bookmarks: &[Bookmark], filter: &FilterState) -> Vec<Bookmark> {
    match &filter.active_project {
        Some(project_id) => bookmarks
            .iter()
            .filter(|b| b.has_project(project_id))
            .cloned()
            .collect(),
        None => bookmarks.to_vec(),
    }
}
