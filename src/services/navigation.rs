//! Pure navigation logic: address-bar input resolution and internal-scheme parsing.

use url::Url;

use crate::types::settings::SearchEngine;
use crate::types::tab::Panel;

/// Pseudo-protocol addressing built-in panels, e.g. `dark://settings?action=get`.
pub const INTERNAL_SCHEME: &str = "dark";

/// A parsed `dark://panel?query` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalUrl {
    pub panel_name: String,
    pub query: Vec<(String, String)>,
}

impl InternalUrl {
    /// The panel this address names, if it is a known one.
    pub fn panel(&self) -> Option<Panel> {
        Panel::from_name(&self.panel_name)
    }

    /// First value for `key` in the query string.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn action(&self) -> Option<&str> {
        self.param("action").filter(|a| !a.is_empty())
    }
}

/// Returns true if `url` uses the internal scheme.
pub fn is_internal(url: &str) -> bool {
    url.trim()
        .split_once(':')
        .map(|(scheme, _)| scheme.eq_ignore_ascii_case(INTERNAL_SCHEME))
        .unwrap_or(false)
}

/// Parses an internal-scheme address. Accepts both `dark://name` and `dark:name`.
pub fn parse_internal(url: &str) -> Option<InternalUrl> {
    let trimmed = url.trim();
    let (scheme, rest) = trimmed.split_once(':')?;
    if !scheme.eq_ignore_ascii_case(INTERNAL_SCHEME) {
        return None;
    }

    let rest = rest.trim_start_matches('/');
    let (target, query) = match rest.split_once('?') {
        Some((target, query)) => (target, query),
        None => (rest, ""),
    };
    let panel_name = target.trim_end_matches('/').to_lowercase();

    let query = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Some(InternalUrl { panel_name, query })
}

/// Turns address-bar text into a navigable URL.
///
/// Full URLs and internal addresses pass through, bare hosts get a scheme,
/// anything else becomes a search on the configured engine. Blank input
/// yields `None`.
pub fn resolve_input(input: &str, engine: SearchEngine) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_internal(trimmed) {
        return Some(trimmed.to_string());
    }

    let has_scheme_separator = trimmed.contains("://");
    let is_localhost = trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1");
    let is_ip = trimmed.parse::<std::net::IpAddr>().is_ok();
    if (is_localhost || is_ip) && !has_scheme_separator {
        return Some(format!("http://{}", trimmed));
    }

    if let Ok(u) = Url::parse(trimmed) {
        let scheme = u.scheme();
        let known = matches!(scheme, "http" | "https" | "file" | "about" | "data");
        let needs_host = scheme == "http" || scheme == "https";
        if known && (u.has_host() || !needs_host) {
            return Some(trimmed.to_string());
        }
    }

    if !trimmed.contains(' ') && trimmed.contains('.') && !trimmed.ends_with('.') {
        let candidate = format!("https://{}", trimmed);
        if let Ok(u) = Url::parse(&candidate) {
            if u.host().is_some() {
                return Some(candidate);
            }
        }
    }

    Some(engine.query_url(trimmed))
}
