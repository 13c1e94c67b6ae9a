use std::fmt;

// === TabError ===

/// Errors related to tab management operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// The provided tab index is out of bounds.
    InvalidIndex(usize),
    /// The operation needs a web tab but the tab at this index is a panel.
    NotWebTab(usize),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::InvalidIndex(index) => write!(f, "Invalid tab index: {}", index),
            TabError::NotWebTab(index) => write!(f, "Tab {} is not a web tab", index),
        }
    }
}

impl std::error::Error for TabError {}

// === DownloadError ===

/// Errors related to download management operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// Download with the given ID was not found.
    NotFound(String),
    /// The requested action is not legal from the record's current state.
    InvalidTransition { id: String, state: String },
    /// Writing the download history failed.
    PersistenceError(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::NotFound(id) => write!(f, "Download not found: {}", id),
            DownloadError::InvalidTransition { id, state } => {
                write!(f, "Download {} cannot change from state {}", id, state)
            }
            DownloadError::PersistenceError(msg) => {
                write!(f, "Download history error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DownloadError {}

// === SessionError ===

/// Errors related to session management operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Failed to serialize or deserialize session data.
    SerializationError(String),
    /// The settings store could not persist the session.
    PersistenceError(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SerializationError(msg) => {
                write!(f, "Session serialization error: {}", msg)
            }
            SessionError::PersistenceError(msg) => {
                write!(f, "Session persistence error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
        }
    }
}

impl std::error::Error for SettingsError {}
