use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Queued,
    Downloading,
    Paused,
    Completed,
    Cancelled,
    Failed,
    Interrupted,
}

impl DownloadState {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Completed
                | DownloadState::Cancelled
                | DownloadState::Failed
                | DownloadState::Interrupted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Queued => "queued",
            DownloadState::Downloading => "downloading",
            DownloadState::Paused => "paused",
            DownloadState::Completed => "completed",
            DownloadState::Cancelled => "cancelled",
            DownloadState::Failed => "failed",
            DownloadState::Interrupted => "interrupted",
        }
    }
}

/// A file download with its progress and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "total")]
    pub total_bytes: Option<u64>,
    #[serde(rename = "received")]
    pub received_bytes: u64,
    pub state: DownloadState,
    #[serde(rename = "path")]
    pub destination_path: PathBuf,
}

impl DownloadRecord {
    /// Whole-number completion percentage, 0 when the total is unknown.
    pub fn percent(&self) -> u8 {
        match self.total_bytes {
            Some(total) if total > 0 => ((self.received_bytes.min(total) * 100) / total) as u8,
            _ => 0,
        }
    }
}

/// State reported by the render engine for a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineDownloadState {
    InProgress,
    Paused,
    Completed,
    Cancelled,
    Failed,
    Interrupted,
}

/// Severity attached to user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}
