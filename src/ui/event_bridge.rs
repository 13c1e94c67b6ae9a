//! Host collaborators that forward every call as a JSON event.
//!
//! The RPC server has no window or web engine of its own. These
//! implementations queue `{"event": ...}` objects in an [`EventOutbox`]; the
//! server drains the outbox to stdout before each response so the external
//! host can act on them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::host::{DownloadHandle, NotificationSink, RenderEngine, ShellUi};
use crate::types::download::Severity;
use crate::types::tab::{NavigationStep, TabInfo, ViewId};

/// Queue of host events shared by all bridge collaborators.
#[derive(Clone, Default)]
pub struct EventOutbox {
    events: Rc<RefCell<VecDeque<Value>>>,
}

impl EventOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Value) {
        self.events.borrow_mut().push_back(event);
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<Value> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

/// Window geometry last reported by the host.
pub type GeometryCell = Rc<RefCell<Option<Vec<u8>>>>;

/// Render engine whose views live in the external host.
pub struct BridgeEngine {
    outbox: EventOutbox,
    next_view: u64,
}

impl BridgeEngine {
    pub fn new(outbox: EventOutbox) -> Self {
        Self { outbox, next_view: 1 }
    }
}

impl RenderEngine for BridgeEngine {
    fn create_view(&mut self) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;
        self.outbox.push(json!({"event": "view_created", "view": view.0}));
        view
    }

    fn load(&mut self, view: ViewId, url: &str) {
        self.outbox.push(json!({"event": "view_load", "view": view.0, "url": url}));
    }

    fn step(&mut self, view: ViewId, step: NavigationStep) {
        self.outbox.push(json!({"event": "view_navigate", "view": view.0, "step": step}));
    }

    fn destroy_view(&mut self, view: ViewId) {
        self.outbox.push(json!({"event": "view_destroyed", "view": view.0}));
    }
}

pub struct BridgeShell {
    outbox: EventOutbox,
    geometry: GeometryCell,
}

impl BridgeShell {
    pub fn new(outbox: EventOutbox, geometry: GeometryCell) -> Self {
        Self { outbox, geometry }
    }
}

impl ShellUi for BridgeShell {
    fn set_address(&mut self, text: &str) {
        self.outbox.push(json!({"event": "address", "text": text}));
    }

    fn tabs_changed(&mut self, tabs: &[TabInfo]) {
        self.outbox.push(json!({"event": "tabs_changed", "tabs": tabs}));
    }

    fn show_tab(&mut self, index: usize) {
        self.outbox.push(json!({"event": "show_tab", "index": index}));
    }

    fn show_message(&mut self, message: &str, severity: Severity) {
        self.outbox.push(json!({"event": "message", "text": message, "severity": severity}));
    }

    fn close_window(&mut self) {
        self.outbox.push(json!({"event": "close_window"}));
    }

    fn window_geometry(&self) -> Option<Vec<u8>> {
        self.geometry.borrow().clone()
    }

    fn restore_window_geometry(&mut self, blob: &[u8]) {
        *self.geometry.borrow_mut() = Some(blob.to_vec());
        let encoded = crate::rpc_handler::base64_encode(blob);
        self.outbox.push(json!({"event": "restore_geometry", "geometry": encoded}));
    }

    fn reveal_folder(&mut self, path: &Path) {
        self.outbox.push(json!({"event": "reveal_folder", "path": path.display().to_string()}));
    }
}

pub struct BridgeNotifications {
    outbox: EventOutbox,
}

impl BridgeNotifications {
    pub fn new(outbox: EventOutbox) -> Self {
        Self { outbox }
    }
}

impl NotificationSink for BridgeNotifications {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.outbox.push(json!({"event": "notification", "text": message, "severity": severity}));
    }

    fn downloads_changed(&mut self) {
        self.outbox.push(json!({"event": "downloads_changed"}));
    }
}

/// Handle for a download owned by the host, addressed by the host's request token.
pub struct BridgeDownload {
    outbox: EventOutbox,
    request: String,
}

impl BridgeDownload {
    pub fn new(outbox: EventOutbox, request: &str) -> Self {
        Self { outbox, request: request.to_string() }
    }

    fn emit(&self, action: &str) {
        self.outbox.push(json!({"event": "download_control", "request": self.request, "action": action}));
    }
}

impl DownloadHandle for BridgeDownload {
    fn accept(&mut self, destination: &Path) {
        self.outbox.push(json!({
            "event": "download_accept",
            "request": self.request,
            "path": destination.display().to_string(),
        }));
    }

    fn pause(&mut self) {
        self.emit("pause");
    }

    fn resume(&mut self) {
        self.emit("resume");
    }

    fn cancel(&mut self) {
        self.emit("cancel");
    }
}
