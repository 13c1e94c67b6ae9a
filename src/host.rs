//! Collaborator interfaces implemented by the embedding host.
//!
//! The core never renders anything itself. It drives a [`RenderEngine`] for web
//! surfaces, a [`ShellUi`] for window-level state and a [`NotificationSink`] for
//! transient messages. All of them are injected at construction time and are
//! called on the event-loop thread only.

use std::path::Path;

use crate::types::download::Severity;
use crate::types::tab::{NavigationStep, TabInfo, ViewId};

/// The embedded web engine that produces displayable surfaces.
pub trait RenderEngine {
    /// Creates a new, empty web surface.
    fn create_view(&mut self) -> ViewId;
    /// Starts loading `url` in the surface.
    fn load(&mut self, view: ViewId, url: &str);
    fn step(&mut self, view: ViewId, step: NavigationStep);
    /// Releases the surface. The handle is never used again afterwards.
    fn destroy_view(&mut self, view: ViewId);
}

/// Window-level UI state the tab manager keeps in sync.
pub trait ShellUi {
    fn set_address(&mut self, text: &str);
    /// Tab list contents changed (creation, close, title, kind).
    fn tabs_changed(&mut self, tabs: &[TabInfo]);
    /// Highlights the active tab and shows its content.
    fn show_tab(&mut self, index: usize);
    fn show_message(&mut self, message: &str, severity: Severity);
    /// The last tab was closed; the window should terminate.
    fn close_window(&mut self);
    fn window_geometry(&self) -> Option<Vec<u8>>;
    fn restore_window_geometry(&mut self, blob: &[u8]);
    /// Opens a folder in the desktop file manager.
    fn reveal_folder(&mut self, path: &Path);
}

/// Receives download notifications.
pub trait NotificationSink {
    /// Human-readable message. Hosts may hide these.
    fn notify(&mut self, message: &str, severity: Severity);
    /// Download state changed; icons and lists should refresh.
    fn downloads_changed(&mut self);
}

/// Live engine handle for one running download.
pub trait DownloadHandle {
    /// Accepts the request and starts writing to `destination`.
    fn accept(&mut self, destination: &Path);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}
