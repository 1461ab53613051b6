//! Property-based tests for derived view ordering and filter exclusivity.
//!
//! These tests verify that visible bookmarks are always pinned-first and
//! newest-first, that filtering only ever removes bookmarks, and that the
//! category, project, tag and favorites axes never combine.

use std::collections::BTreeMap;

use neuromark::services::view_state::{filter_bookmarks, matches_filter, visible_bookmarks};
use neuromark::types::bookmark::Bookmark;
use neuromark::types::view::FilterState;
use proptest::prelude::*;

fn arb_bookmarks() -> impl Strategy<Value = Vec<Bookmark>> {
    proptest::collection::vec(
        (
            any::<bool>(),
            any::<bool>(),
            0i64..1_000,
            proptest::sample::subsequence(vec!["Design", "Tools", "News"], 0..=3),
            proptest::sample::subsequence(vec!["rust", "web", "ui"], 0..=3),
        ),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (pinned, favorite, created_at, categories, tags))| Bookmark {
                id: i.to_string(),
                url: format!("https://b{}.dev", i),
                title: format!("Bookmark {}", i),
                summary: String::new(),
                categories: categories.into_iter().map(str::to_string).collect(),
                tags: tags.into_iter().map(str::to_string).collect(),
                project_ids: if i % 2 == 0 { vec!["p1".to_string()] } else { vec![] },
                project_contexts: BTreeMap::new(),
                created_at,
                is_favorite: favorite,
                is_pinned: pinned,
                icon_emoji: None,
            })
            .collect()
    })
}

#[derive(Debug, Clone)]
enum FilterAction {
    Category(&'static str),
    Project(&'static str),
    Tag(&'static str),
    FavoritesOn,
    ToggleFavorites,
}

fn arb_action() -> impl Strategy<Value = FilterAction> {
    prop_oneof![
        prop::sample::select(vec!["All", "Design", "Tools"]).prop_map(FilterAction::Category),
        Just(FilterAction::Project("p1")),
        prop::sample::select(vec!["rust", "web"]).prop_map(FilterAction::Tag),
        Just(FilterAction::FavoritesOn),
        Just(FilterAction::ToggleFavorites),
    ]
}

fn apply(filter: &mut FilterState, action: &FilterAction) {
    match action {
        FilterAction::Category(c) => filter.select_category(c),
        FilterAction::Project(p) => filter.select_project(p),
        FilterAction::Tag(t) => filter.select_tag(t),
        FilterAction::FavoritesOn => filter.set_favorites_only(true),
        FilterAction::ToggleFavorites => filter.toggle_favorites_only(),
    }
}

fn active_axes(filter: &FilterState) -> usize {
    [
        filter.active_category.is_some(),
        filter.active_project.is_some(),
        filter.active_tag.is_some(),
        filter.favorites_only,
    ]
    .iter()
    .filter(|on| **on)
    .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn visible_bookmarks_are_pinned_first_then_newest(bookmarks in arb_bookmarks()) {
        let visible = visible_bookmarks(&bookmarks, &FilterState::new());
        prop_assert_eq!(visible.len(), bookmarks.len());
        for pair in visible.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.is_pinned >= b.is_pinned, "pinned must come first");
            if a.is_pinned == b.is_pinned {
                prop_assert!(a.created_at >= b.created_at, "newest first within a group");
            }
        }
    }

    #[test]
    fn filter_axes_never_combine(
        bookmarks in arb_bookmarks(),
        actions in proptest::collection::vec(arb_action(), 1..10),
    ) {
        let mut filter = FilterState::new();
        for action in &actions {
            apply(&mut filter, action);
            prop_assert!(active_axes(&filter) <= 1, "axes combined after {:?}: {:?}", action, filter);
        }

        let filtered = filter_bookmarks(&bookmarks, &filter);
        prop_assert!(filtered.len() <= bookmarks.len());
        for b in &filtered {
            prop_assert!(matches_filter(b, &filter));
        }
        let excluded = bookmarks.iter().filter(|b| !matches_filter(b, &filter)).count();
        prop_assert_eq!(filtered.len() + excluded, bookmarks.len());
    }
}

// **Property 8: Filter mutual exclusivity**
#[test]
fn tag_resets_category_and_favorites() {
    let mut filter = FilterState::new();
    filter.active_category = Some("Design".to_string());
    filter.favorites_only = true;
    filter.select_tag("rust");
    assert_eq!(filter.category_label(), "All");
    assert!(!filter.favorites_only);
}
