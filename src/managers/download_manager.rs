//! Download Manager for Dark Browser.
//!
//! Tracks downloads handed over by the render engine through their lifecycle,
//! keeps the live engine handles of running downloads and persists finished
//! downloads to a JSON history file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::host::{DownloadHandle, NotificationSink};
use crate::services::settings_engine::SharedSettings;
use crate::types::download::{DownloadRecord, DownloadState, EngineDownloadState, Severity};
use crate::types::errors::DownloadError;

/// Name used when the engine offers nothing usable as a file name.
const FALLBACK_NAME: &str = "download";

/// Strips any directory part from an engine-supplied name so the file lands
/// directly in the download folder.
fn bare_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Trait defining the user-facing download operations.
pub trait DownloadManagerTrait {
    fn pause(&mut self, id: &str) -> Result<(), DownloadError>;
    fn resume(&mut self, id: &str) -> Result<(), DownloadError>;
    fn cancel(&mut self, id: &str) -> Result<(), DownloadError>;
    fn remove(&mut self, id: &str) -> Result<(), DownloadError>;
    fn show(&self, id: &str) -> Result<PathBuf, DownloadError>;
    fn list(&self) -> &[DownloadRecord];
    fn get(&self, id: &str) -> Option<&DownloadRecord>;
}

/// Download manager with an in-memory record list and JSON history.
pub struct DownloadManager {
    records: Vec<DownloadRecord>,
    handles: HashMap<String, Box<dyn DownloadHandle>>,
    history_path: PathBuf,
    download_dir: PathBuf,
    sink: Box<dyn NotificationSink>,
    settings: SharedSettings,
}

impl DownloadManager {
    pub fn new(
        history_path: PathBuf,
        download_dir: PathBuf,
        sink: Box<dyn NotificationSink>,
        settings: SharedSettings,
    ) -> Self {
        let records = load_history(&history_path);
        debug!(count = records.len(), path = %history_path.display(), "Loaded download history");
        Self {
            records,
            handles: HashMap::new(),
            history_path,
            download_dir,
            sink,
            settings,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn find_index(&self, id: &str) -> Result<usize, DownloadError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| DownloadError::NotFound(id.to_string()))
    }

    fn invalid(&self, index: usize) -> DownloadError {
        let record = &self.records[index];
        DownloadError::InvalidTransition {
            id: record.id.clone(),
            state: record.state.as_str().to_string(),
        }
    }

    fn announce(&mut self, message: String, severity: Severity) {
        if self.settings.borrow().notifications_enabled() {
            self.sink.notify(&message, severity);
        }
        self.sink.downloads_changed();
    }

    fn save_history(&self) {
        if let Err(e) = write_history(&self.history_path, &self.records) {
            warn!(error = %e, "Download history could not be written");
        }
    }

    /// Moves a record into a terminal state, releasing its engine handle.
    fn finish(&mut self, index: usize, state: DownloadState) {
        let record = &mut self.records[index];
        record.state = state;
        if state == DownloadState::Completed && record.total_bytes.is_none() {
            record.total_bytes = Some(record.received_bytes);
        }
        let id = record.id.clone();
        let name = record.name.clone();
        self.handles.remove(&id);
        info!(id = %id, state = state.as_str(), "Download finished");
        self.save_history();

        let (message, severity) = match state {
            DownloadState::Completed => (format!("Download completed: {}", name), Severity::Success),
            DownloadState::Cancelled => (format!("Download cancelled: {}", name), Severity::Warning),
            DownloadState::Interrupted => (format!("Download interrupted: {}", name), Severity::Error),
            _ => (format!("Download failed: {}", name), Severity::Error),
        };
        self.announce(message, severity);
    }

    /// Registers a download offered by the engine and starts it.
    pub fn on_download_requested(
        &mut self,
        name: &str,
        total: Option<u64>,
        mut handle: Box<dyn DownloadHandle>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let name = bare_file_name(name);
        let destination = self.download_dir.join(&name);
        self.records.insert(
            0,
            DownloadRecord {
                id: id.clone(),
                name: name.clone(),
                total_bytes: total,
                received_bytes: 0,
                state: DownloadState::Queued,
                destination_path: destination.clone(),
            },
        );

        handle.accept(&destination);
        self.handles.insert(id.clone(), handle);
        self.records[0].state = DownloadState::Downloading;
        info!(id = %id, name = %name, "Download started");
        self.announce(format!("Download started: {}", name), Severity::Success);
        id
    }

    /// Applies a progress report. Ignored unless the download is running.
    pub fn on_progress(&mut self, id: &str, received: u64, total: Option<u64>) {
        let Ok(index) = self.find_index(id) else {
            debug!(id, "Progress for unknown download");
            return;
        };
        let record = &mut self.records[index];
        if record.state != DownloadState::Downloading {
            return;
        }
        if let Some(total) = total {
            record.total_bytes = Some(total);
        }
        record.received_bytes = match record.total_bytes {
            Some(total) => received.min(total),
            None => received,
        };
        self.sink.downloads_changed();
    }

    /// Applies a state reported by the engine. Events for finished downloads
    /// are duplicates and ignored.
    pub fn on_state_changed(&mut self, id: &str, state: EngineDownloadState) {
        let Ok(index) = self.find_index(id) else {
            debug!(id, "State change for unknown download");
            return;
        };
        let current = self.records[index].state;
        if current.is_terminal() {
            debug!(id, state = current.as_str(), "Ignoring event for finished download");
            return;
        }
        let name = self.records[index].name.clone();
        match state {
            EngineDownloadState::InProgress => {
                if current == DownloadState::Paused {
                    self.records[index].state = DownloadState::Downloading;
                    self.announce(format!("Download resumed: {}", name), Severity::Info);
                }
            }
            EngineDownloadState::Paused => {
                if current == DownloadState::Downloading {
                    self.records[index].state = DownloadState::Paused;
                    self.announce(format!("Download paused: {}", name), Severity::Info);
                }
            }
            EngineDownloadState::Completed => self.finish(index, DownloadState::Completed),
            EngineDownloadState::Cancelled => self.finish(index, DownloadState::Cancelled),
            EngineDownloadState::Failed => self.finish(index, DownloadState::Failed),
            EngineDownloadState::Interrupted => self.finish(index, DownloadState::Interrupted),
        }
    }

    pub fn pause_all(&mut self) {
        let ids: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.state == DownloadState::Downloading)
            .map(|r| r.id.clone())
            .collect();
        for id in ids {
            let _ = self.pause(&id);
        }
    }

    pub fn resume_all(&mut self) {
        let ids: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.state == DownloadState::Paused)
            .map(|r| r.id.clone())
            .collect();
        for id in ids {
            let _ = self.resume(&id);
        }
    }

    /// True while any download is queued or transferring.
    pub fn has_active_downloads(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.state, DownloadState::Queued | DownloadState::Downloading))
    }
}

impl DownloadManagerTrait for DownloadManager {
    fn pause(&mut self, id: &str) -> Result<(), DownloadError> {
        let index = self.find_index(id)?;
        if self.records[index].state != DownloadState::Downloading {
            return Err(self.invalid(index));
        }
        if let Some(handle) = self.handles.get_mut(id) {
            handle.pause();
        }
        self.records[index].state = DownloadState::Paused;
        let name = self.records[index].name.clone();
        self.announce(format!("Download paused: {}", name), Severity::Info);
        Ok(())
    }

    fn resume(&mut self, id: &str) -> Result<(), DownloadError> {
        let index = self.find_index(id)?;
        if self.records[index].state != DownloadState::Paused {
            return Err(self.invalid(index));
        }
        if let Some(handle) = self.handles.get_mut(id) {
            handle.resume();
        }
        self.records[index].state = DownloadState::Downloading;
        let name = self.records[index].name.clone();
        self.announce(format!("Download resumed: {}", name), Severity::Info);
        Ok(())
    }

    fn cancel(&mut self, id: &str) -> Result<(), DownloadError> {
        let index = self.find_index(id)?;
        if self.records[index].state.is_terminal() {
            return Err(self.invalid(index));
        }
        if let Some(handle) = self.handles.get_mut(id) {
            handle.cancel();
        }
        self.finish(index, DownloadState::Cancelled);
        Ok(())
    }

    /// Deletes a finished download from the history. The file stays on disk.
    fn remove(&mut self, id: &str) -> Result<(), DownloadError> {
        let index = self.find_index(id)?;
        if !self.records[index].state.is_terminal() {
            return Err(self.invalid(index));
        }
        self.records.remove(index);
        self.save_history();
        self.sink.downloads_changed();
        Ok(())
    }

    /// Folder containing the download's file.
    fn show(&self, id: &str) -> Result<PathBuf, DownloadError> {
        let index = self.find_index(id)?;
        let path = &self.records[index].destination_path;
        Ok(path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.download_dir.clone()))
    }

    fn list(&self) -> &[DownloadRecord] {
        &self.records
    }

    fn get(&self, id: &str) -> Option<&DownloadRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

fn load_history(path: &Path) -> Vec<DownloadRecord> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<DownloadRecord>>(&content) {
        Ok(records) => records.into_iter().filter(|r| r.state.is_terminal()).collect(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Download history is malformed, ignoring it");
            Vec::new()
        }
    }
}

fn write_history(path: &Path, records: &[DownloadRecord]) -> Result<(), DownloadError> {
    let finished: Vec<&DownloadRecord> = records.iter().filter(|r| r.state.is_terminal()).collect();
    let json = serde_json::to_string_pretty(&finished)
        .map_err(|e| DownloadError::PersistenceError(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DownloadError::PersistenceError(e.to_string()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| DownloadError::PersistenceError(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| DownloadError::PersistenceError(e.to_string()))
}
