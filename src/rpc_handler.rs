//! RPC method handler for the Dark Browser JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! managers held by an [`RpcSession`]; host-facing side effects are queued in
//! the session's [`EventOutbox`].

use serde_json::{json, Value};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::app::{App, AppPaths};
use crate::managers::download_manager::DownloadManagerTrait;
use crate::managers::tab_manager::TabManagerTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::download::EngineDownloadState;
use crate::types::errors::TabError;
use crate::types::tab::{NavigationStep, Panel, ViewId};
use crate::ui::event_bridge::{
    BridgeDownload, BridgeEngine, BridgeNotifications, BridgeShell, EventOutbox, GeometryCell,
};

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(input).map_err(|e| format!("base64 decode error: {}", e))
}

/// An [`App`] wired to event-bridge collaborators.
pub struct RpcSession {
    pub app: App,
    pub outbox: EventOutbox,
    geometry: GeometryCell,
}

impl RpcSession {
    pub fn new(paths: AppPaths) -> Self {
        let outbox = EventOutbox::new();
        let geometry = GeometryCell::default();
        let app = App::new(
            paths,
            Box::new(BridgeEngine::new(outbox.clone())),
            Box::new(BridgeShell::new(outbox.clone(), geometry.clone())),
            Box::new(BridgeNotifications::new(outbox.clone())),
        );
        Self { app, outbox, geometry }
    }
}

fn index_param(params: &Value) -> Result<usize, String> {
    params
        .get("index")
        .and_then(|v| v.as_u64())
        .map(|i| i as usize)
        .ok_or_else(|| "missing index".to_string())
}

fn view_param(params: &Value) -> Result<ViewId, String> {
    params
        .get("view")
        .and_then(|v| v.as_u64())
        .map(ViewId)
        .ok_or_else(|| "missing view".to_string())
}

fn typed_param<T: serde::de::DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    let raw = params.get(key).cloned().ok_or_else(|| format!("missing {}", key))?;
    serde_json::from_value(raw).map_err(|e| format!("invalid {}: {}", key, e))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// Download actions on unknown ids or in the wrong state are not errors;
/// they answer `{"ok": false}`.
pub fn handle_method(session: &mut RpcSession, method: &str, params: &Value) -> Result<Value, String> {
    let app = &mut session.app;
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Tabs ───
        "tab.open_url" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            app.tab_manager.open_url(url);
            Ok(json!({"ok": true}))
        }
        "tab.navigate_input" => {
            let text = params.get("text").and_then(|v| v.as_str()).ok_or("missing text")?;
            app.tab_manager.navigate_input(text);
            Ok(json!({"ok": true}))
        }
        "tab.create_web" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let index = app.tab_manager.create_web_tab(url);
            Ok(json!({"index": index}))
        }
        "tab.create_panel" => {
            let name = params.get("panel").and_then(|v| v.as_str()).ok_or("missing panel")?;
            let panel = Panel::from_name(name).ok_or_else(|| format!("unknown panel: {}", name))?;
            let index = app.tab_manager.create_panel_tab(panel);
            Ok(json!({"index": index}))
        }
        "tab.close" => {
            let index = index_param(params)?;
            app.tab_manager.close_tab(index);
            Ok(json!({"ok": true, "remaining": app.tab_manager.tab_count()}))
        }
        "tab.set_active" => {
            let index = index_param(params)?;
            app.tab_manager.set_active(index);
            Ok(json!({"active": app.tab_manager.active_index()}))
        }
        "tab.duplicate" => {
            let index = index_param(params)?;
            let new_index = app.tab_manager.duplicate_tab(index);
            Ok(json!({"index": new_index}))
        }
        "tab.toggle_pin" => {
            let index = index_param(params)?;
            let outcome = app.tab_manager.toggle_pin(index);
            Ok(json!({"outcome": outcome}))
        }
        "tab.toggle_favorite" => {
            let index = index_param(params)?;
            let favorite = app.tab_manager.toggle_favorite(index).map_err(|e| e.to_string())?;
            Ok(json!({"favorite": favorite}))
        }
        "tab.navigate" => {
            let step: NavigationStep = typed_param(params, "step")?;
            app.tab_manager.navigate(step);
            Ok(json!({"ok": true}))
        }
        "tab.get" => {
            let index = index_param(params)?;
            let tab = app
                .tab_manager
                .tab(index)
                .ok_or_else(|| TabError::InvalidIndex(index).to_string())?;
            serde_json::to_value(tab).map_err(|e| e.to_string())
        }
        "tab.list" => Ok(json!({
            "tabs": app.tab_manager.tabs(),
            "active": app.tab_manager.active_index(),
        })),

        // ─── Render engine events ───
        "engine.title_changed" => {
            let view = view_param(params)?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("");
            app.tab_manager.on_title_changed(view, title);
            Ok(json!({"ok": true}))
        }
        "engine.url_changed" => {
            let view = view_param(params)?;
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            app.tab_manager.on_url_changed(view, url);
            Ok(json!({"ok": true}))
        }
        "engine.load_started" => {
            let view = view_param(params)?;
            app.tab_manager.on_load_started(view);
            Ok(json!({"ok": true}))
        }
        "engine.load_finished" => {
            let view = view_param(params)?;
            let ok = params.get("ok").and_then(|v| v.as_bool()).unwrap_or(true);
            app.tab_manager.on_load_finished(view, ok);
            Ok(json!({"ok": true}))
        }
        "engine.crashed" => {
            let view = view_param(params)?;
            app.tab_manager.on_render_crashed(view);
            Ok(json!({"ok": true}))
        }
        "engine.download_requested" => {
            let request = params.get("request").and_then(|v| v.as_str()).ok_or("missing request")?;
            let name = params.get("name").and_then(|v| v.as_str()).ok_or("missing name")?;
            let total = params.get("total").and_then(|v| v.as_u64());
            let handle = BridgeDownload::new(session.outbox.clone(), request);
            let id = app.download_requested(name, total, Box::new(handle));
            Ok(json!({"id": id}))
        }
        "engine.download_progress" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let received = params.get("received").and_then(|v| v.as_u64()).ok_or("missing received")?;
            let total = params.get("total").and_then(|v| v.as_u64());
            app.download_manager.on_progress(id, received, total);
            Ok(json!({"ok": true}))
        }
        "engine.download_state" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let state: EngineDownloadState = typed_param(params, "state")?;
            app.download_manager.on_state_changed(id, state);
            Ok(json!({"ok": true}))
        }

        // ─── Downloads ───
        "download.list" => Ok(json!(app.download_manager.list())),
        "download.pause" | "download.resume" | "download.cancel" | "download.remove" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let result = match method {
                "download.pause" => app.download_manager.pause(id),
                "download.resume" => app.download_manager.resume(id),
                "download.cancel" => app.download_manager.cancel(id),
                _ => app.download_manager.remove(id),
            };
            if let Err(e) = &result {
                tracing::debug!(method, error = %e, "Download action ignored");
            }
            Ok(json!({"ok": result.is_ok()}))
        }
        "download.show" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            match app.show_download(id) {
                Ok(folder) => Ok(json!({"ok": true, "path": folder.display().to_string()})),
                Err(_) => Ok(json!({"ok": false})),
            }
        }
        "download.pause_all" => {
            app.download_manager.pause_all();
            Ok(json!({"ok": true}))
        }
        "download.resume_all" => {
            app.download_manager.resume_all();
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings.borrow();
            match params.get("key").and_then(|v| v.as_str()) {
                Some(key) => Ok(settings.get(key).cloned().unwrap_or(Value::Null)),
                None => Ok(Value::Object(settings.all().clone())),
            }
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings.borrow_mut().set(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            app.reset_settings().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Favorites ───
        "favorites.list" => Ok(json!(app.tab_manager.favorites().favorites())),
        "favorites.add" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or(url);
            app.tab_manager.add_favorite(url, title);
            Ok(json!({"ok": true}))
        }
        "favorites.remove" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let removed = app.tab_manager.remove_favorite(url);
            Ok(json!({"ok": removed}))
        }

        // ─── Session / window ───
        "session.export" => {
            serde_json::to_value(app.tab_manager.export_session()).map_err(|e| e.to_string())
        }
        "window.set_geometry" => {
            let encoded = params.get("geometry").and_then(|v| v.as_str()).ok_or("missing geometry")?;
            let blob = base64_decode(encoded)?;
            *session.geometry.borrow_mut() = Some(blob);
            Ok(json!({"ok": true}))
        }

        // ─── Internal scheme ───
        "scheme.request" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let response = app.handle_scheme_request(url);
            Ok(json!({"mime": response.mime, "body": response.body}))
        }

        "app.shutdown" => {
            app.shutdown();
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
