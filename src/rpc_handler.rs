//! RPC method handler for the Markstash JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a call to the store or the session flows held
//! by [`App`]. Store calls run under the store lock and never await; only the
//! `auth.*` calls that hit the network are async.

use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::services::auth_flow::SessionCheck;
use crate::types::bookmark::{BookmarkPatch, NewBookmark};
use crate::types::view::{CollectionSelector, FilterType, SortBy, ViewMode};
use crate::types::workspace::{NewCollection, NewWorkspace};

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing {}", name))
}

fn opt_str_param(params: &Value, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn ok() -> Result<Value, String> {
    Ok(json!({"ok": true}))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Auth ───
        "auth.register" => {
            let email = str_param(params, "email")?;
            let password = str_param(params, "password")?;
            let full_name = params.get("full_name").and_then(Value::as_str);
            app.auth
                .register(email, password, full_name)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"authenticated": true}))
        }
        "auth.check" => match app.auth.check_session().await {
            SessionCheck::Guest => Ok(json!({"status": "guest"})),
            SessionCheck::Refreshed => Ok(json!({"status": "refreshed"})),
            SessionCheck::Expired(e) => Ok(json!({"status": "expired", "error": e.to_string()})),
        },
        "auth.callback" => {
            let url = str_param(params, "url")?;
            let cleaned = app.auth.handle_auth_callback(url);
            Ok(json!({"authenticated": cleaned.is_some(), "url": cleaned}))
        }

        "ping" => Ok(json!({"pong": true})),

        _ => handle_store_method(app, method, params),
    }
}

fn handle_store_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    let mut store = app.store();
    match method {
        "state.get" => Ok(json!({
            "hydrated": store.is_hydrated(),
            "canAddWorkspace": store.can_add_workspace(),
            "canDeleteWorkspace": store.can_delete_workspace(),
            "state": to_json(store.state())?,
        })),

        // ─── Session ───
        "session.login" => {
            let token = str_param(params, "token")?;
            store.login(token);
            ok()
        }
        "session.logout" => {
            store.logout();
            ok()
        }

        // ─── Selection ───
        "select.workspace" => {
            store.set_selected_workspace(str_param(params, "workspace_id")?);
            ok()
        }
        "select.collection" => {
            let selector = CollectionSelector::from(str_param(params, "collection")?);
            store.set_selected_collection(selector);
            ok()
        }
        "search.set" => {
            store.set_search_query(str_param(params, "query")?);
            ok()
        }
        "view.set" => {
            let mode = str_param(params, "mode")?
                .parse::<ViewMode>()
                .map_err(|e| e.to_string())?;
            store.set_view_mode(mode);
            ok()
        }
        "sort.set" => {
            let sort = str_param(params, "sort")?
                .parse::<SortBy>()
                .map_err(|e| e.to_string())?;
            store.set_sort_by(sort);
            ok()
        }
        "filter.set" => {
            let filter = str_param(params, "filter")?
                .parse::<FilterType>()
                .map_err(|e| e.to_string())?;
            store.set_filter_type(filter);
            ok()
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let input = NewBookmark {
                title: str_param(params, "title")?.to_string(),
                url: str_param(params, "url")?.to_string(),
                collection_id: opt_str_param(params, "collection_id"),
                description: opt_str_param(params, "description"),
                icon: opt_str_param(params, "icon"),
            };
            Ok(json!({"id": store.add_bookmark(input)}))
        }
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let patch: BookmarkPatch = match params.get("patch") {
                Some(raw) => serde_json::from_value(raw.clone())
                    .map_err(|e| format!("invalid patch: {}", e))?,
                None => return Err("missing patch".to_string()),
            };
            store.update_bookmark(id, &patch);
            ok()
        }
        "bookmark.favorite" => {
            store.toggle_favorite(str_param(params, "id")?);
            ok()
        }
        "bookmark.archive" => {
            store.archive_bookmark(str_param(params, "id")?);
            ok()
        }
        "bookmark.restore_archive" => {
            store.restore_from_archive(str_param(params, "id")?);
            ok()
        }
        "bookmark.trash" => {
            store.trash_bookmark(str_param(params, "id")?);
            ok()
        }
        "bookmark.restore_trash" => {
            store.restore_from_trash(str_param(params, "id")?);
            ok()
        }
        "bookmark.delete" => {
            store.permanently_delete(str_param(params, "id")?);
            ok()
        }

        // ─── Views ───
        "bookmarks.filtered" => to_json(&store.get_filtered_bookmarks()),
        "bookmarks.favorites" => to_json(&store.get_favorite_bookmarks()),
        "bookmarks.archived" => to_json(&store.get_archived_bookmarks()),
        "bookmarks.trashed" => to_json(&store.get_trashed_bookmarks()),

        // ─── Collections ───
        "collection.add" => {
            let input = NewCollection {
                name: str_param(params, "name")?.to_string(),
                workspace_id: str_param(params, "workspace_id")?.to_string(),
                icon: opt_str_param(params, "icon"),
            };
            Ok(json!({"id": store.add_collection(input)}))
        }
        "collection.delete" => {
            store.delete_collection(str_param(params, "id")?);
            ok()
        }
        "collection.count" => {
            let count = store.collection_bookmark_count(str_param(params, "id")?);
            Ok(json!({"count": count}))
        }

        // ─── Workspaces ───
        "workspace.add" => {
            let input = NewWorkspace {
                name: str_param(params, "name")?.to_string(),
                color: str_param(params, "color")?.to_string(),
            };
            Ok(json!({"id": store.add_workspace(input)}))
        }
        "workspace.delete" => {
            store.delete_workspace(str_param(params, "id")?);
            ok()
        }
        "workspace.stats" => to_json(&store.workspace_stats(str_param(params, "id")?)),
        "workspace.collections" => {
            to_json(&store.workspace_collections(str_param(params, "id")?))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
