//! Dark Browser: demo mode.
//!
//! Drives the core against console collaborators in a throwaway directory,
//! printing what a real window would show. The host-facing entry point is the
//! `darkbrowser-rpc` binary.

use std::cell::RefCell;
use std::error::Error;
use std::path::Path;
use std::rc::Rc;

use darkbrowser::app::{App, AppPaths};
use darkbrowser::host::{DownloadHandle, NotificationSink, RenderEngine, ShellUi};
use darkbrowser::logging::init_logging;
use darkbrowser::managers::download_manager::DownloadManagerTrait;
use darkbrowser::managers::tab_manager::TabManagerTrait;
use darkbrowser::types::download::{EngineDownloadState, Severity};
use darkbrowser::types::tab::{NavigationStep, TabInfo, ViewId};

struct ConsoleEngine {
    next: u64,
}

impl RenderEngine for ConsoleEngine {
    fn create_view(&mut self) -> ViewId {
        self.next += 1;
        ViewId(self.next)
    }

    fn load(&mut self, view: ViewId, url: &str) {
        println!("    [engine] view {} loads {}", view.0, url);
    }

    fn step(&mut self, view: ViewId, step: NavigationStep) {
        println!("    [engine] view {} {:?}", view.0, step);
    }

    fn destroy_view(&mut self, view: ViewId) {
        println!("    [engine] view {} destroyed", view.0);
    }
}

struct ConsoleShell {
    geometry: Rc<RefCell<Option<Vec<u8>>>>,
}

impl ShellUi for ConsoleShell {
    fn set_address(&mut self, text: &str) {
        println!("    [address] {}", text);
    }

    fn tabs_changed(&mut self, tabs: &[TabInfo]) {
        let titles: Vec<String> = tabs
            .iter()
            .map(|t| if t.active { format!("*{}", t.title) } else { t.title.clone() })
            .collect();
        println!("    [tabs] {}", titles.join(" | "));
    }

    fn show_tab(&mut self, _index: usize) {}

    fn show_message(&mut self, message: &str, severity: Severity) {
        println!("    [{:?}] {}", severity, message);
    }

    fn close_window(&mut self) {
        println!("    [window] close requested");
    }

    fn window_geometry(&self) -> Option<Vec<u8>> {
        self.geometry.borrow().clone()
    }

    fn restore_window_geometry(&mut self, blob: &[u8]) {
        *self.geometry.borrow_mut() = Some(blob.to_vec());
    }

    fn reveal_folder(&mut self, path: &Path) {
        println!("    [window] reveal {}", path.display());
    }
}

struct ConsoleNotifications;

impl NotificationSink for ConsoleNotifications {
    fn notify(&mut self, message: &str, severity: Severity) {
        println!("    [notify:{:?}] {}", severity, message);
    }

    fn downloads_changed(&mut self) {}
}

struct ConsoleDownload;

impl DownloadHandle for ConsoleDownload {
    fn accept(&mut self, destination: &Path) {
        println!("    [download] saving to {}", destination.display());
    }
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn cancel(&mut self) {}
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn build_app(dir: &Path) -> App {
    App::new(
        AppPaths::in_dir(dir),
        Box::new(ConsoleEngine { next: 0 }),
        Box::new(ConsoleShell { geometry: Rc::new(RefCell::new(Some(vec![0, 0, 4, 0, 3, 0]))) }),
        Box::new(ConsoleNotifications),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let dir = std::env::temp_dir().join(format!("darkbrowser-demo-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;

    println!();
    println!("  Dark Browser v{} - Demo Mode", env!("CARGO_PKG_VERSION"));
    println!();

    let mut app = build_app(&dir);

    section("Startup");
    app.startup();

    section("Tabs");
    app.tab_manager.open_url("https://www.rust-lang.org");
    app.tab_manager.navigate_input("borrow checker");
    app.tab_manager.open_url("dark://settings");
    app.tab_manager.open_url("https://docs.rs");
    app.tab_manager.open_url("dark://home");
    println!("    toggle pin on tab 0: {:?}", app.tab_manager.toggle_pin(0));

    section("Downloads");
    let id = app.download_requested("rustup-init.sh", Some(2048), Box::new(ConsoleDownload));
    app.download_manager.on_progress(&id, 1024, None);
    app.download_manager.pause(&id)?;
    app.download_manager.resume(&id)?;
    app.download_manager.on_state_changed(&id, EngineDownloadState::Completed);
    for record in app.download_manager.list() {
        println!("    {} {} {}%", record.name, record.state.as_str(), record.percent());
    }

    section("Shutdown and restore");
    app.shutdown();
    drop(app);
    let mut restored = build_app(&dir);
    restored.startup();
    restored.tab_manager.reload_restored_tabs();
    println!("    restored {} tabs", restored.tab_manager.tab_count());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
