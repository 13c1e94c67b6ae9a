//! Responder for `dark://` requests issued by the render engine.
//!
//! Panels are rendered as self-contained HTML documents. Query verbs
//! (`?action=...`) are applied before the document is produced, so a page can
//! trigger an action by navigating to its own address.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::managers::download_manager::{DownloadManager, DownloadManagerTrait};
use crate::managers::favorites_manager::FavoritesManager;
use crate::services::navigation::{self, InternalUrl};
use crate::services::settings_engine::{SettingsEngineTrait, SharedSettings};
use crate::types::download::DownloadRecord;
use crate::types::tab::Panel;

pub const MIME_HTML: &str = "text/html";
pub const MIME_JSON: &str = "application/json";

const NOT_FOUND: &str = "<h1>Not found</h1>";

/// Document returned for an internal-scheme request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeResponse {
    pub mime: &'static str,
    pub body: String,
}

impl SchemeResponse {
    fn html(body: String) -> Self {
        Self { mime: MIME_HTML, body }
    }

    fn not_found() -> Self {
        Self::html(NOT_FOUND.to_string())
    }
}

/// Everything a scheme request may read or act on.
pub struct SchemeContext<'a> {
    pub settings: &'a SharedSettings,
    pub downloads: &'a mut DownloadManager,
    pub favorites: &'a FavoritesManager,
    pub reveal_folder: &'a mut dyn FnMut(&Path),
}

/// Answers a `dark://` request.
pub fn respond(url: &str, ctx: &mut SchemeContext<'_>) -> SchemeResponse {
    let Some(request) = navigation::parse_internal(url) else {
        return SchemeResponse::not_found();
    };
    match request.panel() {
        Some(Panel::Settings) => settings_request(&request, ctx),
        Some(Panel::Downloads) => downloads_request(&request, ctx),
        Some(Panel::Home) => SchemeResponse::html(render_home(ctx.favorites)),
        None => {
            debug!(url, "Unknown internal page");
            SchemeResponse::not_found()
        }
    }
}

fn settings_request(request: &InternalUrl, ctx: &mut SchemeContext<'_>) -> SchemeResponse {
    match request.action() {
        Some("get") => {
            let body = Value::Object(ctx.settings.borrow().all().clone()).to_string();
            return SchemeResponse { mime: MIME_JSON, body };
        }
        Some("set") => match (request.param("key"), request.param("value")) {
            (Some(key), Some(value)) if !key.is_empty() => {
                if let Err(e) = ctx
                    .settings
                    .borrow_mut()
                    .set(key, Value::String(value.to_string()))
                {
                    warn!(key, error = %e, "Setting change from page not saved");
                }
            }
            _ => debug!("settings set without key"),
        },
        Some(other) => debug!(action = other, "Unknown settings action"),
        None => {}
    }
    let settings = ctx.settings.borrow();
    SchemeResponse::html(render_settings(settings.all()))
}

fn downloads_request(request: &InternalUrl, ctx: &mut SchemeContext<'_>) -> SchemeResponse {
    if let Some(action) = request.action() {
        let id = request.param("id").unwrap_or_default();
        // Unknown ids and illegal transitions are not surfaced to the page.
        let result = match action {
            "cancel" => ctx.downloads.cancel(id),
            "remove" => ctx.downloads.remove(id),
            "pause" => ctx.downloads.pause(id),
            "resume" => ctx.downloads.resume(id),
            "show" => ctx.downloads.show(id).map(|folder| (ctx.reveal_folder)(&folder)),
            other => {
                debug!(action = other, "Unknown downloads action");
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!(action, error = %e, "Download action ignored");
        }
    }
    SchemeResponse::html(render_downloads(ctx.downloads.list()))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = ":root{--bg:#0f1115;--fg:#e5e7eb;--muted:#9aa3af;--card:#141821;--accent:#3b82f6}\
body{margin:0;background:var(--bg);color:var(--fg);font:14px system-ui,sans-serif}\
main{max-width:900px;margin:40px auto;padding:0 20px}\
.item{background:var(--card);border:1px solid rgba(255,255,255,.08);border-radius:14px;padding:12px;margin-bottom:12px}\
.row{display:flex;gap:12px;align-items:center;justify-content:space-between}\
.progress{height:8px;border-radius:8px;background:#0e131b;overflow:hidden}\
.bar{height:100%;background:var(--accent)}\
a{color:var(--fg)}.muted{color:var(--muted)}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset='utf-8'/>\n<title>Dark · {}</title>\n\
         <style>{}</style>\n</head>\n<body>\n<main>\n<h2>{}</h2>\n{}\n</main>\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        escape_html(title),
        body
    )
}

fn render_home(favorites: &FavoritesManager) -> String {
    let pins: Vec<String> = favorites
        .pinned_sites()
        .iter()
        .map(|p| {
            format!(
                "<div class='item'><a href='{}'>{}</a></div>",
                escape_html(&p.url),
                escape_html(&p.title)
            )
        })
        .collect();
    let body = if pins.is_empty() {
        "<div class='muted'>No pinned sites</div>".to_string()
    } else {
        pins.join("\n")
    };
    page(Panel::Home.title(), &body)
}

fn render_settings(settings: &serde_json::Map<String, Value>) -> String {
    let rows: Vec<String> = settings
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array() && !v.is_null())
        .map(|(k, v)| {
            let shown = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "<div class='item row'><b>{}</b><span>{}</span></div>",
                escape_html(k),
                escape_html(&shown)
            )
        })
        .collect();
    page(Panel::Settings.title(), &rows.join("\n"))
}

/// Renders the download list with per-item actions.
pub fn render_downloads(records: &[DownloadRecord]) -> String {
    let rows: Vec<String> = records
        .iter()
        .map(|d| {
            let size_mb = d.total_bytes.unwrap_or(0) as f64 / 1024.0 / 1024.0;
            let pct = d.percent();
            let id = escape_html(&d.id);
            format!(
                "<div class='item'>\
                 <div class='row'><div><b>{name}</b> <span class='muted'>{size:.2} MB</span></div>\
                 <div class='actions'>\
                 <a href='dark://downloads?action=show&amp;id={id}'>Show in folder</a> \
                 <a href='dark://downloads?action=cancel&amp;id={id}'>Cancel</a> \
                 <a href='dark://downloads?action=remove&amp;id={id}'>Remove</a>\
                 </div></div>\
                 <div class='progress'><div class='bar' style='width:{pct}%;'></div></div>\
                 <div class='row'><span>{state}</span><span>{pct}%</span></div>\
                 </div>",
                name = escape_html(&d.name),
                size = size_mb,
                id = id,
                pct = pct,
                state = d.state.as_str(),
            )
        })
        .collect();
    let body = if rows.is_empty() {
        "<div class='muted'>No downloads</div>".to_string()
    } else {
        rows.join("\n")
    };
    page(Panel::Downloads.title(), &body)
}
