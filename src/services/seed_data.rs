//! Built-in dataset used on first launch and whenever a persisted
//! collection is missing or unreadable.

use std::collections::BTreeMap;

use crate::types::bookmark::{Bookmark, Project};

const DEFAULT_CATEGORIES: [&str; 9] = [
    "Design",
    "Development",
    "Marketing",
    "Business",
    "News",
    "Tools",
    "Inspiration",
    "Research",
    "Other",
];

/// Current time in milliseconds since the UNIX epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

pub fn default_projects() -> Vec<Project> {
    let project = |id: &str, name: &str, color: &str, description: &str| Project {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        description: Some(description.to_string()),
    };
    vec![
        project(
            "p1",
            "Alpha SaaS",
            "#FF3B30",
            "Resources and moodboards for the Q3 SaaS platform redesign.",
        ),
        project(
            "p2",
            "Internal Tools",
            "#007AFF",
            "Documentation and libraries for our internal dashboarding system.",
        ),
        project(
            "p3",
            "Personal Blog",
            "#AF52DE",
            "Ideas, inspirations and tech stack for my personal portfolio.",
        ),
    ]
}

pub fn default_bookmarks() -> Vec<Bookmark> {
    default_bookmarks_at(now_millis())
}

/// The starter bookmarks, with creation times relative to `now`.
pub fn default_bookmarks_at(now: i64) -> Vec<Bookmark> {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let contexts = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>()
    };

    vec![
        Bookmark {
            id: "1".to_string(),
            url: "https://ui.shadcn.com/".to_string(),
            title: "Shadcn UI".to_string(),
            summary: "Beautifully designed components built with Radix UI and Tailwind CSS."
                .to_string(),
            categories: strings(&["Development", "Design"]),
            tags: strings(&["React", "UI/UX", "Tailwind", "prod"]),
            project_ids: strings(&["p1"]),
            project_contexts: contexts(&[("p1", "Component Library Source")]),
            created_at: now - 100_000,
            is_favorite: true,
            is_pinned: true,
            icon_emoji: None,
        },
        Bookmark {
            id: "2".to_string(),
            url: "https://vercel.com".to_string(),
            title: "Vercel".to_string(),
            summary: "Develop. Preview. Ship. The best frontend developer experience on the web."
                .to_string(),
            categories: strings(&["Development", "Tools"]),
            tags: strings(&["Next.js", "Deployment", "Cloud", "dev"]),
            project_ids: strings(&["p1", "p3"]),
            project_contexts: contexts(&[("p1", "Hosting Target"), ("p3", "Reference for Analytics")]),
            created_at: now - 200_000,
            is_favorite: true,
            is_pinned: false,
            icon_emoji: None,
        },
        Bookmark {
            id: "3".to_string(),
            url: "https://figma.com".to_string(),
            title: "Figma".to_string(),
            summary: "The collaborative interface design tool.".to_string(),
            categories: strings(&["Design", "Tools"]),
            tags: strings(&["UI/UX", "Design", "Free"]),
            project_ids: strings(&["p3"]),
            project_contexts: BTreeMap::new(),
            created_at: now - 400_000,
            is_favorite: true,
            is_pinned: false,
            icon_emoji: None,
        },
    ]
}
