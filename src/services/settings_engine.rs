// Dark Browser Settings Engine
// Flat key→value settings, merged over a fixed default map on every load.
// Every `set` writes through to the JSON file at the platform-specific config path.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{default_settings, keys, SearchEngine, SettingsMap};

/// Settings shared by every component on the event-loop thread.
pub type SharedSettings = Rc<RefCell<SettingsEngine>>;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> &SettingsMap;
    fn save(&self) -> Result<(), SettingsError>;
    fn all(&self) -> &SettingsMap;
    fn get(&self, key: &str) -> Option<&Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: SettingsMap,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine holding the defaults until `load` is called.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("settings.json"));

        Self {
            config_path,
            settings: default_settings(),
        }
    }

    /// Creates an engine, loads it and wraps it for sharing.
    pub fn open_shared(path_override: Option<PathBuf>) -> SharedSettings {
        let mut engine = Self::new(path_override);
        engine.load();
        Rc::new(RefCell::new(engine))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }

    pub fn search_engine(&self) -> SearchEngine {
        self.get_str(keys::SEARCH)
            .map(SearchEngine::from_name)
            .unwrap_or_default()
    }

    pub fn home_url(&self) -> &str {
        match self.get_str(keys::HOME) {
            Some(home) if !home.trim().is_empty() => home,
            _ => "dark://home",
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.get_str(keys::NOTIFICATIONS) != Some("disable")
    }

    fn read_file(path: &Path) -> Result<SettingsMap, SettingsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
        serde_json::from_str::<SettingsMap>(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file, merged over the defaults.
    ///
    /// A missing file is created with the defaults. An unreadable or malformed
    /// file yields the defaults; loading never fails.
    fn load(&mut self) -> &SettingsMap {
        let mut merged = default_settings();

        if !self.config_path.exists() {
            self.settings = merged;
            if let Err(e) = self.save() {
                warn!(path = %self.config_path.display(), error = %e, "Could not write default settings");
            }
            return &self.settings;
        }

        match Self::read_file(&self.config_path) {
            Ok(stored) => {
                debug!(keys = stored.len(), "Loaded stored settings");
                merged.extend(stored);
            }
            Err(e) => {
                warn!(path = %self.config_path.display(), error = %e, "Falling back to default settings");
            }
        }

        self.settings = merged;
        &self.settings
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist, writes a temporary
    /// sibling file and renames it over the target.
    fn save(&self) -> Result<(), SettingsError> {
        let path = self.config_path.as_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;
        fs::rename(&tmp_path, path)
            .map_err(|e| SettingsError::IoError(format!("Failed to replace config file: {}", e)))?;

        Ok(())
    }

    fn all(&self) -> &SettingsMap {
        &self.settings
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Updates one key and writes the whole map through to disk.
    ///
    /// The in-memory value is kept even if the write fails.
    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.trim().is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        self.settings.insert(key.to_string(), value);
        self.save()
    }

    /// Resets all settings to the defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = default_settings();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
