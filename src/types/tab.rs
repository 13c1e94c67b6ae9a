use serde::{Deserialize, Serialize};

/// Engine-issued handle for a web view surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Built-in panels reachable through the internal scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Home,
    Settings,
    Downloads,
}

impl Panel {
    /// Resolves a `dark://<name>` host to a panel.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "home" => Some(Panel::Home),
            "settings" => Some(Panel::Settings),
            "downloads" => Some(Panel::Downloads),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Panel::Home => "home",
            Panel::Settings => "settings",
            Panel::Downloads => "downloads",
        }
    }

    /// Default tab title for a freshly opened panel.
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Home => "Home",
            Panel::Settings => "Settings",
            Panel::Downloads => "Downloads",
        }
    }

    /// Internal-scheme address shown in the address bar.
    pub fn address(&self) -> String {
        format!("{}://{}", crate::services::navigation::INTERNAL_SCHEME, self.name())
    }
}

/// Serializable tab kind tag, as stored in sessions and reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabType {
    Web,
    Home,
    Settings,
    Downloads,
}

impl From<Panel> for TabType {
    fn from(panel: Panel) -> Self {
        match panel {
            Panel::Home => TabType::Home,
            Panel::Settings => TabType::Settings,
            Panel::Downloads => TabType::Downloads,
        }
    }
}

/// Loading state of a web tab's surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
    Crashed,
}

/// Content of a web tab: the engine surface and what it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct WebPage {
    pub view: ViewId,
    pub url: String,
    pub load_state: LoadState,
}

/// What a tab displays. Only `Web` owns an engine surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Web(WebPage),
    Home,
    Settings,
    Downloads,
}

impl TabContent {
    pub fn tab_type(&self) -> TabType {
        match self {
            TabContent::Web(_) => TabType::Web,
            TabContent::Home => TabType::Home,
            TabContent::Settings => TabType::Settings,
            TabContent::Downloads => TabType::Downloads,
        }
    }

    pub fn panel(&self) -> Option<Panel> {
        match self {
            TabContent::Web(_) => None,
            TabContent::Home => Some(Panel::Home),
            TabContent::Settings => Some(Panel::Settings),
            TabContent::Downloads => Some(Panel::Downloads),
        }
    }

    pub fn from_panel(panel: Panel) -> Self {
        match panel {
            Panel::Home => TabContent::Home,
            Panel::Settings => TabContent::Settings,
            Panel::Downloads => TabContent::Downloads,
        }
    }
}

/// A browser tab owned by the tab manager.
#[derive(Debug, Clone)]
pub struct Tab {
    pub content: TabContent,
    pub title: String,
    pub pinned: bool,
    pub favorite: bool,
}

impl Tab {
    pub fn url(&self) -> Option<&str> {
        match &self.content {
            TabContent::Web(page) => Some(page.url.as_str()),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<ViewId> {
        match &self.content {
            TabContent::Web(page) => Some(page.view),
            _ => None,
        }
    }
}

/// Read-only snapshot of a tab handed out to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub index: usize,
    pub kind: TabType,
    pub title: String,
    pub url: Option<String>,
    pub pinned: bool,
    pub favorite: bool,
    pub load_state: Option<LoadState>,
    pub active: bool,
}

/// History navigation on the active web tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationStep {
    Back,
    Forward,
    Reload,
}

/// Result of toggling a tab's pinned state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinOutcome {
    Pinned,
    Unpinned,
    LimitReached,
    NotApplicable,
}
