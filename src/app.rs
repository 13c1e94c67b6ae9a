//! App Core for Dark Browser.
//!
//! Central struct wiring the settings store, the tab manager and the download
//! manager to the host collaborators, and running the startup and shutdown
//! sequences.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::host::{DownloadHandle, NotificationSink, RenderEngine, ShellUi};
use crate::managers::download_manager::{DownloadManager, DownloadManagerTrait};
use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::platform;
use crate::services::scheme_handler::{self, SchemeContext, SchemeResponse};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait, SharedSettings};
use crate::types::errors::{DownloadError, SettingsError};

/// On-disk locations used by the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub settings_file: PathBuf,
    pub history_file: PathBuf,
    pub download_dir: PathBuf,
}

impl AppPaths {
    /// Platform directories, honoring the `DARKBROWSER_*_DIR` overrides.
    pub fn from_env() -> Self {
        Self {
            settings_file: platform::get_config_dir().join("settings.json"),
            history_file: platform::get_data_dir().join("downloads.json"),
            download_dir: platform::get_downloads_dir(),
        }
    }

    /// Everything under one directory. Used by tests and portable setups.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings_file: dir.join("settings.json"),
            history_file: dir.join("downloads.json"),
            download_dir: dir.join("Downloads"),
        }
    }
}

/// Central application struct holding all managers.
pub struct App {
    pub settings: SharedSettings,
    pub tab_manager: TabManager,
    pub download_manager: DownloadManager,
}

impl App {
    pub fn new(
        paths: AppPaths,
        engine: Box<dyn RenderEngine>,
        ui: Box<dyn ShellUi>,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        let settings = SettingsEngine::open_shared(Some(paths.settings_file));
        let tab_manager = TabManager::new(engine, ui, settings.clone());
        let download_manager =
            DownloadManager::new(paths.history_file, paths.download_dir, sink, settings.clone());

        Self {
            settings,
            tab_manager,
            download_manager,
        }
    }

    /// Startup sequence: restore the previous session, or open Home.
    pub fn startup(&mut self) {
        let session = self.tab_manager.session_manager().load_or_none();
        self.tab_manager.restore_session(session);
        info!(tabs = self.tab_manager.tab_count(), "Dark Browser started");
    }

    /// Shutdown sequence: pause running downloads and save the session.
    pub fn shutdown(&mut self) {
        if self.download_manager.has_active_downloads() {
            info!("Pausing active downloads before exit");
            self.download_manager.pause_all();
        }
        self.tab_manager.persist_session();
        info!("Dark Browser stopped");
    }

    /// Restores default settings while keeping the open tabs as the session.
    pub fn reset_settings(&mut self) -> Result<(), SettingsError> {
        let result = self.settings.borrow_mut().reset();
        self.tab_manager.on_settings_reset();
        result
    }

    /// Registers a download offered by the engine; returns its id.
    pub fn download_requested(
        &mut self,
        name: &str,
        total: Option<u64>,
        handle: Box<dyn DownloadHandle>,
    ) -> String {
        self.download_manager.on_download_requested(name, total, handle)
    }

    /// Reveals the folder holding a download in the desktop file manager.
    pub fn show_download(&mut self, id: &str) -> Result<PathBuf, DownloadError> {
        let folder = self.download_manager.show(id)?;
        self.tab_manager.ui_mut().reveal_folder(&folder);
        Ok(folder)
    }

    /// Answers a `dark://` request from the render engine.
    pub fn handle_scheme_request(&mut self, url: &str) -> SchemeResponse {
        let mut revealed: Option<PathBuf> = None;
        let mut reveal = |folder: &Path| revealed = Some(folder.to_path_buf());
        let response = scheme_handler::respond(
            url,
            &mut SchemeContext {
                settings: &self.settings,
                downloads: &mut self.download_manager,
                favorites: self.tab_manager.favorites(),
                reveal_folder: &mut reveal,
            },
        );
        if let Some(folder) = revealed {
            self.tab_manager.ui_mut().reveal_folder(&folder);
        }
        response
    }
}
