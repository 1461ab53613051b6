//! Property-based tests for the merge engine.
//!
//! These tests verify that merging by id keeps exactly the union of ids,
//! that the primary copy wins every collision, and that the result keeps
//! primary order followed by the secondary's additions.

use std::collections::HashSet;

use neuromark::services::merge::{
    merge_by_id, merge_full_state, merge_unique, resolve_by_first_authority, FirstAuthority,
};
use neuromark::services::seed_data;
use neuromark::types::bookmark::Project;
use neuromark::types::state::{CloudState, FullState, ThemePreference, CLOUD_STATE_VERSION};
use proptest::prelude::*;

fn project(id: &str, side: &str) -> Project {
    Project {
        id: id.to_string(),
        name: side.to_string(),
        color: "#000000".to_string(),
        description: None,
    }
}

/// Collections with unique ids drawn from a small pool so that the two
/// sides overlap often.
fn arb_side(side: &'static str) -> impl Strategy<Value = Vec<Project>> {
    proptest::collection::btree_set(0u8..12, 0..8)
        .prop_map(move |ids| ids.into_iter().map(|n| project(&n.to_string(), side)).collect::<Vec<_>>())
        .prop_shuffle()
}

fn ids(projects: &[Project]) -> Vec<String> {
    projects.iter().map(|p| p.id.clone()).collect()
}

// **Property 3: Merge-by-id determinism and completeness**
//
// *For all* collections A and B, `merge_by_id(A, B)` contains exactly the
// ids of A ∪ B, and every id present in both resolves to A's version.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn merge_by_id_is_the_union_with_primary_winning(
        primary in arb_side("primary"),
        secondary in arb_side("secondary"),
    ) {
        let merged = merge_by_id(&primary, &secondary);

        let expected: HashSet<String> = ids(&primary).into_iter().chain(ids(&secondary)).collect();
        let actual: HashSet<String> = ids(&merged).into_iter().collect();
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(merged.len(), expected.len(), "no id appears twice");

        let primary_ids: HashSet<String> = ids(&primary).into_iter().collect();
        for p in &merged {
            let expected_side = if primary_ids.contains(&p.id) { "primary" } else { "secondary" };
            prop_assert_eq!(p.name.as_str(), expected_side);
        }

        prop_assert_eq!(&merged, &merge_by_id(&primary, &secondary), "deterministic");
        prop_assert_eq!(&merged, &resolve_by_first_authority(&primary, &secondary));
    }

    #[test]
    fn merge_by_id_keeps_primary_order_then_additions(
        primary in arb_side("primary"),
        secondary in arb_side("secondary"),
    ) {
        let merged = merge_by_id(&primary, &secondary);
        prop_assert_eq!(&ids(&merged[..primary.len()]), &ids(&primary));

        let primary_ids: HashSet<String> = ids(&primary).into_iter().collect();
        let additions: Vec<String> = ids(&secondary)
            .into_iter()
            .filter(|id| !primary_ids.contains(id))
            .collect();
        prop_assert_eq!(ids(&merged[primary.len()..]), additions);
    }

    #[test]
    fn merge_unique_dedupes_in_first_seen_order(
        primary in proptest::collection::vec("[a-e]", 0..8),
        secondary in proptest::collection::vec("[a-e]", 0..8),
    ) {
        let merged = merge_unique(&primary, &secondary);
        let mut seen = HashSet::new();
        let expected: Vec<String> = primary
            .iter()
            .chain(secondary.iter())
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();
        prop_assert_eq!(merged, expected);
    }
}

// **Property 4: Merge-by-id ordering**
#[test]
fn merge_by_id_ordering_example() {
    let a = vec![project("1", "a"), project("2", "a")];
    let b = vec![project("2", "b"), project("3", "b")];
    let merged = merge_by_id(&a, &b);
    assert_eq!(ids(&merged), vec!["1", "2", "3"]);
    assert_eq!(merged[1].name, "a");
}

// **Property 5: merge_unique dedupe**
#[test]
fn merge_unique_example() {
    let merged = merge_unique(
        &["a".to_string(), "b".to_string()],
        &["b".to_string(), "c".to_string()],
    );
    assert_eq!(merged, vec!["a", "b", "c"]);
}

#[test]
fn full_state_merge_prefers_remote_and_keeps_local_theme_when_missing() {
    let remote = CloudState {
        version: CLOUD_STATE_VERSION,
        bookmarks: vec![],
        categories: vec![],
        projects: vec![project("1", "remote")],
        theme: None,
    };
    let local = FullState {
        bookmarks: vec![],
        projects: vec![project("1", "local"), project("2", "local")],
        categories: vec![],
        theme: ThemePreference::Dark,
    };

    let merged = merge_full_state(&FirstAuthority, &remote, &local);
    assert_eq!(merged.projects[0].name, "remote");
    assert_eq!(merged.projects.len(), 2);
    assert_eq!(merged.theme, ThemePreference::Dark);
    assert_eq!(merged.categories, seed_data::default_categories());
}
