use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Flat key→value settings map as stored on disk.
pub type SettingsMap = Map<String, Value>;

/// Well-known settings keys.
pub mod keys {
    pub const VERSION: &str = "version";
    pub const THEME: &str = "theme";
    pub const HOME: &str = "home";
    pub const SEARCH: &str = "search";
    pub const PINNED: &str = "pinned";
    pub const FAVORITES: &str = "favorites";
    pub const FAVORITES_BAR: &str = "favorites_bar";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const SESSION: &str = "session";
}

/// Returns the fixed default map that every loaded settings map is merged over.
pub fn default_settings() -> SettingsMap {
    let mut map = Map::new();
    map.insert(keys::VERSION.into(), json!(env!("CARGO_PKG_VERSION")));
    map.insert(keys::THEME.into(), json!("system"));
    map.insert(keys::HOME.into(), json!("dark://home"));
    map.insert(keys::SEARCH.into(), json!("google"));
    map.insert(keys::NOTIFICATIONS.into(), json!("enable"));
    map.insert(keys::FAVORITES_BAR.into(), json!("show"));
    map.insert(keys::FAVORITES.into(), json!([]));
    map.insert(
        keys::PINNED.into(),
        json!([
            {"title": "ChatGPT", "url": "https://chatgpt.com", "icon": "https://chat.openai.com/favicon.ico"},
            {"title": "GitHub", "url": "https://github.com", "icon": "https://github.githubassets.com/favicons/favicon.png"},
            {"title": "MDN", "url": "https://developer.mozilla.org", "icon": "https://developer.mozilla.org/favicon-48x48.cbbd161b.png"},
        ]),
    );
    map
}

/// Search engine used for address-bar text that is not a URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    DuckDuckGo,
    Bing,
    Brave,
}

impl SearchEngine {
    /// Parses a stored engine name; unknown names fall back to Google.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "duckduckgo" => Self::DuckDuckGo,
            "bing" => Self::Bing,
            "brave" => Self::Brave,
            _ => Self::Google,
        }
    }

    pub fn query_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query);
        match self {
            Self::Google => format!("https://www.google.com/search?q={}", q),
            Self::DuckDuckGo => format!("https://duckduckgo.com/?q={}", q),
            Self::Bing => format!("https://www.bing.com/search?q={}", q),
            Self::Brave => format!("https://search.brave.com/search?q={}", q),
        }
    }
}
