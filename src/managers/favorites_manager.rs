//! Favorites and Home-page pins for Dark Browser.
//!
//! Both lists live in the settings store (`favorites` and `pinned` keys) and
//! are read back on every query, so the store stays the single source of truth.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::services::settings_engine::{SettingsEngineTrait, SharedSettings};
use crate::types::favorite::{FavoriteEntry, PinnedSite};
use crate::types::settings::keys;

/// Maximum number of sites pinned to the Home panel.
pub const MAX_PINS: usize = 9;

/// Result of trying to add a pinned site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinChange {
    Added,
    Removed,
    Full,
}

pub struct FavoritesManager {
    settings: SharedSettings,
}

impl FavoritesManager {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let settings = self.settings.borrow();
        match settings.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) {
        let value = match serde_json::to_value(items) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize list");
                return;
            }
        };
        if let Err(e) = self.settings.borrow_mut().set(key, value) {
            warn!(key = %key, error = %e, "Could not persist list");
        }
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.read_list(keys::FAVORITES)
    }

    pub fn is_favorite(&self, url: &str) -> bool {
        self.favorites().iter().any(|f| f.url == url)
    }

    /// Adds a favorite, replacing any entry with the same URL and moving it last.
    pub fn add_favorite(&self, url: &str, title: &str) {
        let mut favorites: Vec<FavoriteEntry> =
            self.favorites().into_iter().filter(|f| f.url != url).collect();
        favorites.push(FavoriteEntry {
            url: url.to_string(),
            title: title.to_string(),
        });
        self.write_list(keys::FAVORITES, &favorites);
    }

    /// Removes a favorite. Returns false if the URL was not a favorite.
    pub fn remove_favorite(&self, url: &str) -> bool {
        let favorites = self.favorites();
        let before = favorites.len();
        let kept: Vec<FavoriteEntry> = favorites.into_iter().filter(|f| f.url != url).collect();
        if kept.len() == before {
            return false;
        }
        self.write_list(keys::FAVORITES, &kept);
        true
    }

    /// Flips the favorite state of `url`; returns the new state.
    pub fn toggle_favorite(&self, url: &str, title: &str) -> bool {
        if self.remove_favorite(url) {
            false
        } else {
            self.add_favorite(url, title);
            true
        }
    }

    pub fn pinned_sites(&self) -> Vec<PinnedSite> {
        self.read_list(keys::PINNED)
    }

    pub fn is_pinned(&self, url: &str) -> bool {
        self.pinned_sites().iter().any(|p| p.url == url)
    }

    /// Unpins `url` if pinned, otherwise pins it unless the list is full.
    pub fn toggle_pin(&self, url: &str, title: &str) -> PinChange {
        let mut pins = self.pinned_sites();
        if let Some(pos) = pins.iter().position(|p| p.url == url) {
            pins.remove(pos);
            self.write_list(keys::PINNED, &pins);
            return PinChange::Removed;
        }
        if pins.len() >= MAX_PINS {
            return PinChange::Full;
        }
        pins.push(PinnedSite {
            title: title.to_string(),
            url: url.to_string(),
            icon: None,
        });
        self.write_list(keys::PINNED, &pins);
        PinChange::Added
    }
}
