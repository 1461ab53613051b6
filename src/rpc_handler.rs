//! RPC method handler for the NeuroMark JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! library, cloud sync and AI assistant via the `App` struct.

use serde_json::{json, Value};

use crate::app::App;
use crate::host_bridge::{self, HostEffect};
use crate::managers::library_manager::LibraryManagerTrait;
use crate::services::cloud_sync::{RemoteStateStore, SyncOutcome};
use crate::services::sync_session::SyncIdentity;
use crate::services::view_state;
use crate::types::ai::EmojiRequest;
use crate::types::bookmark::{BookmarkDraft, ProjectUpdate};
use crate::types::state::ThemePreference;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing {}", key))
}

fn confirm_param(params: &Value) -> bool {
    params.get("confirm").and_then(Value::as_bool).unwrap_or(false)
}

fn decode<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))
}

fn outcome_json(outcome: &SyncOutcome) -> Value {
    json!({"outcome": outcome.label()})
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Library changes are forwarded to cloud sync before returning. Returns
/// `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method<R: RemoteStateStore>(app: &mut App<R>, method: &str, params: &Value) -> Result<Value, String> {
    let result = dispatch(app, method, params).await;
    app.after_change();
    result
}

async fn dispatch<R: RemoteStateStore>(app: &mut App<R>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!("pong")),

        // ─── State ───
        "state.get" => Ok(json!({
            "state": app.library.state(),
            "filter": app.library.filter(),
        })),
        "view.get" => {
            let library = &app.library;
            let state = library.state();
            let visible = view_state::visible_bookmarks(&state.bookmarks, library.filter());
            Ok(json!({
                "title": view_state::section_title(library.filter(), &state.projects),
                "bookmarks": visible,
                "stats": view_state::stats_summary(state),
                "categories": view_state::category_stats(&state.categories, &state.bookmarks),
                "projects": view_state::project_stats(&state.projects, &state.bookmarks),
                "tags": view_state::popular_tags(&state.bookmarks),
                "filter": library.filter(),
            }))
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let draft: BookmarkDraft = decode(params)?;
            let id = app.library.add_bookmark(draft).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let draft: BookmarkDraft = decode(params)?;
            let changed = app.library.update_bookmark(id, draft).map_err(|e| e.to_string())?;
            Ok(json!({"ok": changed}))
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let confirm = confirm_param(params);
            let deleted = app
                .library
                .delete_bookmark(id, &move |_: &str| confirm)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": deleted}))
        }
        "bookmark.toggle_favorite" => {
            let id = str_param(params, "id")?;
            let now = app.library.toggle_favorite(id).map_err(|e| e.to_string())?;
            Ok(json!({"isFavorite": now}))
        }
        "bookmark.toggle_pin" => {
            let id = str_param(params, "id")?;
            let now = app.library.toggle_pin(id).map_err(|e| e.to_string())?;
            Ok(json!({"isPinned": now}))
        }
        "bookmark.toggle_project" => {
            let id = str_param(params, "id")?;
            let project_id = str_param(params, "projectId")?;
            let linked = app.library.toggle_project(id, project_id).map_err(|e| e.to_string())?;
            Ok(json!({"linked": linked}))
        }
        "bookmark.set_context" => {
            let id = str_param(params, "id")?;
            let project_id = str_param(params, "projectId")?;
            let context = params.get("context").and_then(Value::as_str).unwrap_or_default();
            let changed = app
                .library
                .set_project_context(id, project_id, context)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": changed}))
        }

        // ─── Categories ───
        "category.add" => {
            let name = str_param(params, "name")?;
            Ok(json!({"ok": app.library.add_category(name)}))
        }
        "category.rename" => {
            let from = str_param(params, "from")?;
            let to = str_param(params, "to")?;
            Ok(json!({"ok": app.library.rename_category(from, to)}))
        }
        "category.delete" => {
            let name = str_param(params, "name")?;
            let confirm = confirm_param(params);
            Ok(json!({"ok": app.library.delete_category(name, &move |_: &str| confirm)}))
        }

        // ─── Projects ───
        "project.add" => {
            let name = str_param(params, "name")?;
            let color = str_param(params, "color")?;
            let id = app.library.add_project(name, color).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "project.update" => {
            let id = str_param(params, "id")?;
            let update: ProjectUpdate = decode(params)?;
            let changed = app.library.update_project(id, &update).map_err(|e| e.to_string())?;
            Ok(json!({"ok": changed}))
        }
        "project.delete" => {
            let id = str_param(params, "id")?;
            let confirm = confirm_param(params);
            let deleted = app
                .library
                .delete_project(id, &move |_: &str| confirm)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": deleted}))
        }
        "project.dashboard" => {
            let id = str_param(params, "id")?;
            if app.library.get_project(id).is_none() {
                return Err(format!("Project not found: {}", id));
            }
            Ok(json!(view_state::project_dashboard(id, app.library.bookmarks())))
        }

        // ─── Theme ───
        "theme.set" => {
            let raw = str_param(params, "theme")?;
            let theme = ThemePreference::parse(raw).ok_or_else(|| format!("invalid theme: {}", raw))?;
            app.library.set_theme(theme);
            Ok(json!({"theme": theme}))
        }
        "theme.toggle" => Ok(json!({"theme": app.library.toggle_theme()})),

        // ─── Host shell ───
        "host.command" => {
            let Some(command) = host_bridge::parse_command(params) else {
                return Ok(json!({"handled": false, "openAddBookmark": false}));
            };
            let effect = host_bridge::apply_command(&mut app.library, command);
            Ok(json!({"handled": true, "openAddBookmark": effect == HostEffect::OpenAddBookmark}))
        }

        // ─── Cloud sync ───
        "cloud.status" => Ok(json!(app.cloud_status())),
        "cloud.sign_in" => {
            let identity: SyncIdentity = decode(params)?;
            let outcome = app.sign_in(identity).await.map_err(|e| e.to_string())?;
            Ok(outcome_json(&outcome))
        }
        "cloud.sign_out" => {
            app.sign_out().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "cloud.sync_now" => {
            let outcome = app.sync_now().await.map_err(|e| e.to_string())?;
            Ok(outcome_json(&outcome))
        }

        // ─── AI ───
        "ai.analyze" => {
            let url = str_param(params, "url")?;
            let notes = params.get("notes").and_then(Value::as_str).unwrap_or_default();
            Ok(json!(app.analyze_bookmark(url, notes).await))
        }
        "ai.emoji" => {
            let request: EmojiRequest = decode(params)?;
            Ok(json!({"emoji": app.generate_emoji(&request).await}))
        }
        "ai.ask" => {
            let query = str_param(params, "query")?;
            Ok(json!({"answer": app.ask_library(query).await}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
