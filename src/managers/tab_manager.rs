use std::time::Duration;

use tracing::{debug, info, warn};

use crate::host::{RenderEngine, ShellUi};
use crate::managers::favorites_manager::{FavoritesManager, PinChange};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::services::navigation;
use crate::services::settings_engine::SharedSettings;
use crate::types::download::Severity;
use crate::types::errors::TabError;
use crate::types::session::{SessionDescriptor, SessionTab};
use crate::types::tab::{
    LoadState, NavigationStep, Panel, PinOutcome, Tab, TabContent, TabInfo, TabType, ViewId,
    WebPage,
};

/// Delay before restored web tabs are navigated a second time.
pub const RESTORE_RELOAD_GRACE: Duration = Duration::from_millis(500);

const LOADING_TITLE: &str = "Loading...";
const UNTITLED: &str = "New Tab";

/// Trait defining the tab management interface.
pub trait TabManagerTrait {
    fn create_web_tab(&mut self, url: &str) -> usize;
    fn create_panel_tab(&mut self, panel: Panel) -> usize;
    fn close_tab(&mut self, index: usize);
    fn set_active(&mut self, index: usize);
    fn duplicate_tab(&mut self, index: usize) -> Option<usize>;
    fn toggle_pin(&mut self, index: usize) -> PinOutcome;
    fn open_url(&mut self, url: &str);
    fn export_session(&self) -> SessionDescriptor;
    fn restore_session(&mut self, descriptor: Option<SessionDescriptor>);
    fn tab_count(&self) -> usize;
    fn active_index(&self) -> Option<usize>;
    fn tab(&self, index: usize) -> Option<TabInfo>;
    fn tabs(&self) -> Vec<TabInfo>;
}

/// Owner of the ordered tab collection and the active-tab pointer.
///
/// Callers address tabs by index and receive [`TabInfo`] snapshots. Every
/// state-changing operation persists the session through the
/// [`SessionManager`], except while a [`SessionRestore`] is open.
pub struct TabManager {
    tabs: Vec<Tab>,
    active: Option<usize>,
    engine: Box<dyn RenderEngine>,
    ui: Box<dyn ShellUi>,
    session: SessionManager,
    favorites: FavoritesManager,
    settings: SharedSettings,
    reload_pending: bool,
}

impl TabManager {
    pub fn new(
        engine: Box<dyn RenderEngine>,
        ui: Box<dyn ShellUi>,
        settings: SharedSettings,
    ) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            engine,
            ui,
            session: SessionManager::new(settings.clone()),
            favorites: FavoritesManager::new(settings.clone()),
            settings,
            reload_pending: false,
        }
    }

    pub fn favorites(&self) -> &FavoritesManager {
        &self.favorites
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session
    }

    pub fn ui_mut(&mut self) -> &mut dyn ShellUi {
        self.ui.as_mut()
    }

    // --- internal helpers (never persist on their own) ---

    fn index_of_view(&self, view: ViewId) -> Option<usize> {
        self.tabs.iter().position(|t| t.view() == Some(view))
    }

    fn find_panel(&self, panel: Panel) -> Option<usize> {
        self.tabs.iter().position(|t| t.content.panel() == Some(panel))
    }

    fn active_type(&self) -> Option<TabType> {
        self.active
            .and_then(|i| self.tabs.get(i))
            .map(|t| t.content.tab_type())
    }

    fn open_web_content(&mut self, url: &str) -> TabContent {
        let view = self.engine.create_view();
        self.engine.load(view, url);
        TabContent::Web(WebPage {
            view,
            url: url.to_string(),
            load_state: LoadState::Loading,
        })
    }

    fn push_tab(&mut self, content: TabContent, title: &str) -> usize {
        self.tabs.push(Tab {
            content,
            title: title.to_string(),
            pinned: false,
            favorite: false,
        });
        self.tabs.len() - 1
    }

    /// Recomputes the pinned and favorite flags of every web tab.
    fn refresh_flags(&mut self) {
        let favorites = self.favorites.favorites();
        let pins = self.favorites.pinned_sites();
        for tab in &mut self.tabs {
            match &tab.content {
                TabContent::Web(page) => {
                    tab.favorite = favorites.iter().any(|f| f.url == page.url);
                    tab.pinned = pins.iter().any(|p| p.url == page.url);
                }
                TabContent::Home | TabContent::Settings | TabContent::Downloads => {
                    tab.favorite = false;
                    tab.pinned = false;
                }
            }
        }
    }

    fn info(&self, index: usize, tab: &Tab) -> TabInfo {
        let load_state = match &tab.content {
            TabContent::Web(page) => Some(page.load_state.clone()),
            _ => None,
        };
        TabInfo {
            index,
            kind: tab.content.tab_type(),
            title: tab.title.clone(),
            url: tab.url().map(str::to_string),
            pinned: tab.pinned,
            favorite: tab.favorite,
            load_state,
            active: self.active == Some(index),
        }
    }

    fn publish_tabs(&mut self) {
        let tabs = self.tabs();
        self.ui.tabs_changed(&tabs);
    }

    fn address_for(tab: &Tab) -> String {
        match &tab.content {
            TabContent::Web(page) => page.url.clone(),
            other => other.panel().map(|p| p.address()).unwrap_or_default(),
        }
    }

    fn activate(&mut self, index: usize, persist: bool) {
        self.active = Some(index);
        let address = Self::address_for(&self.tabs[index]);
        self.ui.show_tab(index);
        self.ui.set_address(&address);
        if persist {
            self.persist_session();
        }
    }

    /// Writes the current session to the settings store. Failures are logged.
    pub fn persist_session(&mut self) {
        let descriptor = self.export_session();
        if let Err(e) = self.session.save_session(&descriptor) {
            warn!(error = %e, "Session could not be persisted");
        }
    }

    /// Re-syncs tab flags and the stored session after the settings were
    /// reset to their defaults.
    pub fn on_settings_reset(&mut self) {
        self.refresh_flags();
        self.publish_tabs();
        self.persist_session();
        debug!(tabs = self.tabs.len(), "Session re-saved after settings reset");
    }

    fn destroy_all(&mut self) {
        for tab in self.tabs.drain(..) {
            if let TabContent::Web(page) = tab.content {
                self.engine.destroy_view(page.view);
            }
        }
        self.active = None;
    }

    /// Turns the active Home tab into a web tab in place.
    fn promote_active_to_web(&mut self, index: usize, url: &str) {
        let content = self.open_web_content(url);
        let tab = &mut self.tabs[index];
        tab.content = content;
        tab.title = LOADING_TITLE.to_string();
        debug!(index, url, "Promoted home tab to web tab");
        self.refresh_flags();
        self.publish_tabs();
        self.activate(index, true);
    }

    fn navigate_in_place(&mut self, index: usize, url: &str) {
        let view = match &mut self.tabs[index].content {
            TabContent::Web(page) => {
                page.url = url.to_string();
                page.load_state = LoadState::Loading;
                page.view
            }
            _ => return,
        };
        self.engine.load(view, url);
        self.refresh_flags();
        self.publish_tabs();
        self.ui.set_address(url);
        self.persist_session();
    }

    fn restore_tab(&mut self, entry: &SessionTab) {
        match (entry.kind, entry.url.as_deref()) {
            (TabType::Web, Some(url)) if !url.is_empty() => {
                let content = self.open_web_content(url);
                let title = if entry.title.is_empty() { LOADING_TITLE } else { entry.title.as_str() };
                self.push_tab(content, title);
            }
            (TabType::Web, _) => {
                debug!("Session web tab without url restored as home");
                self.push_tab(TabContent::Home, Panel::Home.title());
            }
            (kind, _) => {
                let panel = match kind {
                    TabType::Settings => Panel::Settings,
                    TabType::Downloads => Panel::Downloads,
                    _ => Panel::Home,
                };
                let title = if entry.title.is_empty() { panel.title() } else { entry.title.as_str() };
                self.push_tab(TabContent::from_panel(panel), title);
            }
        }
    }

    /// Rebuilds the tab collection from `descriptor` with persistence suppressed.
    ///
    /// Nothing is written until the returned [`SessionRestore`] is committed
    /// (or dropped, which commits the descriptor's own active index).
    pub fn begin_restore(&mut self, descriptor: SessionDescriptor) -> SessionRestore<'_> {
        self.destroy_all();
        for entry in &descriptor.tabs {
            self.restore_tab(entry);
        }
        if let Some(geometry) = &descriptor.geometry {
            self.ui.restore_window_geometry(geometry);
        }
        self.refresh_flags();
        debug!(tabs = self.tabs.len(), "Session tabs rebuilt");
        SessionRestore {
            manager: self,
            stored_active: descriptor.active,
            committed: false,
        }
    }

    fn finish_restore(&mut self, stored_active: usize) {
        if self.tabs.is_empty() {
            self.push_tab(TabContent::Home, Panel::Home.title());
        }
        let index = if stored_active < self.tabs.len() {
            stored_active
        } else {
            self.tabs.len() - 1
        };
        self.reload_pending = self.tabs.iter().any(|t| t.view().is_some());
        self.publish_tabs();
        self.activate(index, true);
        info!(tabs = self.tabs.len(), active = index, "Session restored");
    }

    /// True while restored web tabs still await their second navigation.
    pub fn has_pending_reload(&self) -> bool {
        self.reload_pending
    }

    /// Navigates every web tab to its url again. Runs once per restore.
    pub fn reload_restored_tabs(&mut self) {
        if !self.reload_pending {
            return;
        }
        self.reload_pending = false;
        let targets: Vec<(ViewId, String)> = self
            .tabs
            .iter()
            .filter_map(|t| match &t.content {
                TabContent::Web(page) => Some((page.view, page.url.clone())),
                _ => None,
            })
            .collect();
        debug!(count = targets.len(), "Reloading restored web tabs");
        for (view, url) in targets {
            self.engine.load(view, &url);
        }
    }

    /// Resolves address-bar text and opens the result.
    pub fn navigate_input(&mut self, text: &str) {
        let engine = self.settings.borrow().search_engine();
        match navigation::resolve_input(text, engine) {
            Some(url) => self.open_url(&url),
            None => debug!("Ignoring blank address input"),
        }
    }

    /// Back/forward/reload on the active web tab.
    pub fn navigate(&mut self, step: NavigationStep) {
        let Some(index) = self.active else { return };
        let view = match &mut self.tabs[index].content {
            TabContent::Web(page) => {
                if step == NavigationStep::Reload {
                    page.load_state = LoadState::Loading;
                }
                page.view
            }
            _ => return,
        };
        self.engine.step(view, step);
        if step == NavigationStep::Reload {
            self.publish_tabs();
        }
    }

    /// Adds or removes the web tab's url from favorites; returns the new state.
    pub fn toggle_favorite(&mut self, index: usize) -> Result<bool, TabError> {
        let tab = self.tabs.get(index).ok_or(TabError::InvalidIndex(index))?;
        let url = tab.url().ok_or(TabError::NotWebTab(index))?.to_string();
        let title = tab.title.clone();
        let now_favorite = self.favorites.toggle_favorite(&url, &title);
        self.refresh_flags();
        self.publish_tabs();
        Ok(now_favorite)
    }

    pub fn add_favorite(&mut self, url: &str, title: &str) {
        self.favorites.add_favorite(url, title);
        self.refresh_flags();
        self.publish_tabs();
    }

    pub fn remove_favorite(&mut self, url: &str) -> bool {
        let removed = self.favorites.remove_favorite(url);
        if removed {
            self.refresh_flags();
            self.publish_tabs();
        }
        removed
    }

    // --- render engine events ---

    pub fn on_title_changed(&mut self, view: ViewId, title: &str) {
        let Some(index) = self.index_of_view(view) else { return };
        let title = title.trim();
        self.tabs[index].title = if title.is_empty() { UNTITLED } else { title }.to_string();
        self.publish_tabs();
    }

    pub fn on_url_changed(&mut self, view: ViewId, url: &str) {
        let Some(index) = self.index_of_view(view) else { return };
        if url.is_empty() {
            return;
        }
        if let TabContent::Web(page) = &mut self.tabs[index].content {
            page.url = url.to_string();
        }
        self.refresh_flags();
        self.publish_tabs();
        if self.active == Some(index) {
            self.ui.set_address(url);
        }
        self.persist_session();
    }

    pub fn on_load_started(&mut self, view: ViewId) {
        self.set_load_state(view, LoadState::Loading);
    }

    pub fn on_load_finished(&mut self, view: ViewId, ok: bool) {
        let state = if ok {
            LoadState::Loaded
        } else {
            LoadState::Failed("The page could not be loaded".to_string())
        };
        self.set_load_state(view, state);
    }

    pub fn on_render_crashed(&mut self, view: ViewId) {
        warn!(view = view.0, "Render surface crashed");
        self.set_load_state(view, LoadState::Crashed);
    }

    fn set_load_state(&mut self, view: ViewId, state: LoadState) {
        let Some(index) = self.index_of_view(view) else { return };
        if let TabContent::Web(page) = &mut self.tabs[index].content {
            page.load_state = state;
        }
        self.publish_tabs();
    }
}

impl TabManagerTrait for TabManager {
    /// Appends a web tab loading `url` and activates it.
    fn create_web_tab(&mut self, url: &str) -> usize {
        let content = self.open_web_content(url);
        let index = self.push_tab(content, LOADING_TITLE);
        self.refresh_flags();
        self.publish_tabs();
        self.activate(index, true);
        index
    }

    /// Appends a panel tab and activates it. Does not dedupe.
    fn create_panel_tab(&mut self, panel: Panel) -> usize {
        let index = self.push_tab(TabContent::from_panel(panel), panel.title());
        self.publish_tabs();
        self.activate(index, true);
        index
    }

    /// Closes a tab. The active pointer moves to `min(index, count - 1)`;
    /// closing the last tab asks the window to terminate.
    fn close_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            debug!(index, "close_tab ignored: index out of range");
            return;
        }
        let tab = self.tabs.remove(index);
        if let TabContent::Web(page) = tab.content {
            self.engine.destroy_view(page.view);
        }

        if self.tabs.is_empty() {
            self.active = None;
            self.publish_tabs();
            self.persist_session();
            info!("Last tab closed");
            self.ui.close_window();
            return;
        }

        let next = index.min(self.tabs.len() - 1);
        self.active = Some(next);
        self.publish_tabs();
        self.activate(next, true);
    }

    /// Makes the tab at `index` active. Out-of-range indices are ignored.
    fn set_active(&mut self, index: usize) {
        if index >= self.tabs.len() {
            debug!(index, count = self.tabs.len(), "set_active ignored: index out of range");
            return;
        }
        self.activate(index, true);
    }

    /// Web tabs duplicate onto the same url; panels duplicate as a fresh Home tab.
    fn duplicate_tab(&mut self, index: usize) -> Option<usize> {
        let url = match &self.tabs.get(index)?.content {
            TabContent::Web(page) => Some(page.url.clone()),
            _ => None,
        };
        Some(match url {
            Some(url) => self.create_web_tab(&url),
            None => self.create_panel_tab(Panel::Home),
        })
    }

    fn toggle_pin(&mut self, index: usize) -> PinOutcome {
        let Some(tab) = self.tabs.get(index) else {
            return PinOutcome::NotApplicable;
        };
        let Some(url) = tab.url().map(str::to_string) else {
            return PinOutcome::NotApplicable;
        };
        let title = tab.title.clone();

        let outcome = match self.favorites.toggle_pin(&url, &title) {
            PinChange::Added => PinOutcome::Pinned,
            PinChange::Removed => PinOutcome::Unpinned,
            PinChange::Full => {
                self.ui.show_message("Maximum 9 pins allowed", Severity::Warning);
                return PinOutcome::LimitReached;
            }
        };
        self.refresh_flags();
        self.publish_tabs();
        outcome
    }

    /// Routes a url to a panel tab or a web surface.
    fn open_url(&mut self, url: &str) {
        if navigation::is_internal(url) {
            let Some(panel) = navigation::parse_internal(url).and_then(|u| u.panel()) else {
                debug!(url, "Unknown internal panel");
                return;
            };
            match self.find_panel(panel) {
                Some(index) => self.set_active(index),
                None => {
                    self.create_panel_tab(panel);
                }
            }
            return;
        }

        match (self.active, self.active_type()) {
            (Some(index), Some(TabType::Home)) => self.promote_active_to_web(index, url),
            (Some(_), Some(TabType::Settings | TabType::Downloads)) => {
                self.create_web_tab(url);
            }
            (Some(index), Some(TabType::Web)) => self.navigate_in_place(index, url),
            _ => {
                self.create_web_tab(url);
            }
        }
    }

    fn export_session(&self) -> SessionDescriptor {
        let tabs = self
            .tabs
            .iter()
            .map(|t| SessionTab {
                kind: t.content.tab_type(),
                url: t.url().map(str::to_string),
                title: t.title.clone(),
            })
            .collect();
        SessionDescriptor {
            tabs,
            active: self.active.unwrap_or(0),
            geometry: self.ui.window_geometry(),
        }
    }

    /// Restores a stored session, or opens a single Home tab when there is
    /// nothing usable to restore.
    fn restore_session(&mut self, descriptor: Option<SessionDescriptor>) {
        match descriptor {
            Some(descriptor) if !descriptor.tabs.is_empty() => {
                let active = descriptor.active;
                self.begin_restore(descriptor).commit(active);
            }
            _ => {
                debug!("No session to restore, opening home");
                self.destroy_all();
                self.create_panel_tab(Panel::Home);
            }
        }
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn active_index(&self) -> Option<usize> {
        self.active
    }

    fn tab(&self, index: usize) -> Option<TabInfo> {
        self.tabs.get(index).map(|t| self.info(index, t))
    }

    fn tabs(&self) -> Vec<TabInfo> {
        self.tabs
            .iter()
            .enumerate()
            .map(|(i, t)| self.info(i, t))
            .collect()
    }
}

/// An open bulk restore. Holds the tab manager exclusively, so no persisting
/// operation can run until [`SessionRestore::commit`].
pub struct SessionRestore<'a> {
    manager: &'a mut TabManager,
    stored_active: usize,
    committed: bool,
}

impl SessionRestore<'_> {
    pub fn tab_count(&self) -> usize {
        self.manager.tabs.len()
    }

    /// Ends the restore: activates `active_index` (clamped, last tab if out of
    /// range) and persists the session once.
    pub fn commit(mut self, active_index: usize) -> usize {
        self.manager.finish_restore(active_index);
        self.committed = true;
        self.manager.active.unwrap_or(0)
    }
}

impl Drop for SessionRestore<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.manager.finish_restore(self.stored_active);
        }
    }
}
