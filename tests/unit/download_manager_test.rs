use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde_json::{json, Value};
use tempfile::TempDir;

use darkbrowser::host::DownloadHandle;
use darkbrowser::managers::download_manager::{DownloadManager, DownloadManagerTrait};
use darkbrowser::services::settings_engine::{SettingsEngine, SettingsEngineTrait, SharedSettings};
use darkbrowser::types::download::{DownloadRecord, DownloadState, EngineDownloadState};
use darkbrowser::types::errors::DownloadError;
use darkbrowser::types::settings::keys;
use darkbrowser::ui::event_bridge::{BridgeDownload, BridgeNotifications, EventOutbox};

struct Fixture {
    mgr: DownloadManager,
    outbox: EventOutbox,
    settings: SharedSettings,
    tmp: TempDir,
}

fn open(tmp: TempDir, outbox: EventOutbox) -> Fixture {
    let settings = SettingsEngine::open_shared(Some(tmp.path().join("settings.json")));
    let mgr = DownloadManager::new(
        tmp.path().join("downloads.json"),
        tmp.path().join("Downloads"),
        Box::new(BridgeNotifications::new(outbox.clone())),
        settings.clone(),
    );
    Fixture { mgr, outbox, settings, tmp }
}

fn setup() -> Fixture {
    open(TempDir::new().unwrap(), EventOutbox::new())
}

fn request(f: &mut Fixture, name: &str, total: Option<u64>) -> String {
    let handle = BridgeDownload::new(f.outbox.clone(), &format!("req-{}", name));
    f.mgr.on_download_requested(name, total, Box::new(handle))
}

fn events(outbox: &EventOutbox, name: &str) -> Vec<Value> {
    outbox.drain().into_iter().filter(|e| e["event"] == name).collect()
}

fn history(tmp: &TempDir) -> Vec<DownloadRecord> {
    let content = fs::read_to_string(tmp.path().join("downloads.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Handle that records whether it was dropped.
struct DropProbe(Rc<Cell<bool>>);

impl DownloadHandle for DropProbe {
    fn accept(&mut self, _destination: &Path) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn cancel(&mut self) {}
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

// ─── Request ───

#[test]
fn test_request_accepts_into_download_dir() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", Some(100));
    let record = f.mgr.get(&id).unwrap();
    assert_eq!(record.state, DownloadState::Downloading);
    assert_eq!(record.received_bytes, 0);

    let accepted = events(&f.outbox, "download_accept");
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0]["request"], "req-a.zip");
    let expected = f.tmp.path().join("Downloads").join("a.zip");
    assert_eq!(accepted[0]["path"], json!(expected.display().to_string()));
}

#[test]
fn test_request_name_cannot_leave_download_dir() {
    let mut f = setup();
    let dir = f.tmp.path().join("Downloads");
    let cases = [
        ("/etc/evil.sh", "evil.sh"),
        ("../../escape.bin", "escape.bin"),
        ("nested/dir/file.txt", "file.txt"),
        ("..", "download"),
        ("", "download"),
    ];
    for (offered, stored) in cases {
        let id = request(&mut f, offered, None);
        let record = f.mgr.get(&id).unwrap();
        assert_eq!(record.name, stored);
        assert_eq!(record.destination_path, dir.join(stored));
        assert!(record.destination_path.starts_with(&dir));

        let accepted = events(&f.outbox, "download_accept");
        assert_eq!(accepted[0]["path"], json!(dir.join(stored).display().to_string()));
    }
}

#[test]
fn test_records_listed_newest_first() {
    let mut f = setup();
    let first = request(&mut f, "first.bin", None);
    let second = request(&mut f, "second.bin", None);
    let ids: Vec<&str> = f.mgr.list().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
}

// ─── Progress ───

#[test]
fn test_progress_updates_total_and_clamps() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    f.mgr.on_progress(&id, 30, None);
    assert_eq!(f.mgr.get(&id).unwrap().received_bytes, 30);
    f.mgr.on_progress(&id, 60, Some(50));
    let record = f.mgr.get(&id).unwrap();
    assert_eq!(record.total_bytes, Some(50));
    assert_eq!(record.received_bytes, 50);
    assert_eq!(record.percent(), 100);
}

#[test]
fn test_progress_ignored_while_paused() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", Some(100));
    f.mgr.on_progress(&id, 10, None);
    f.mgr.pause(&id).unwrap();
    f.mgr.on_progress(&id, 20, None);
    assert_eq!(f.mgr.get(&id).unwrap().received_bytes, 10);
}

// ─── Full lifecycle ───

#[test]
fn test_download_lifecycle_scenario() {
    let mut f = setup();
    let id = request(&mut f, "movie.mp4", Some(1000));
    f.mgr.on_progress(&id, 400, None);

    f.mgr.pause(&id).unwrap();
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Paused);
    f.mgr.resume(&id).unwrap();
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Downloading);

    let controls: Vec<Value> = events(&f.outbox, "download_control");
    let actions: Vec<&str> = controls.iter().filter_map(|e| e["action"].as_str()).collect();
    assert_eq!(actions, vec!["pause", "resume"]);

    f.mgr.on_progress(&id, 1000, None);
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);
    let record = f.mgr.get(&id).unwrap().clone();
    assert_eq!(record.state, DownloadState::Completed);
    assert_eq!(record.received_bytes, 1000);
    assert!(!f.mgr.has_active_downloads());

    // Late events do not touch a finished record
    f.mgr.on_progress(&id, 5, None);
    f.mgr.on_state_changed(&id, EngineDownloadState::Failed);
    assert_eq!(f.mgr.get(&id).unwrap(), &record);

    assert_eq!(history(&f.tmp), vec![record]);
}

#[test]
fn test_engine_pause_and_resume_events() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    f.mgr.on_state_changed(&id, EngineDownloadState::Paused);
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Paused);
    f.mgr.on_state_changed(&id, EngineDownloadState::InProgress);
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Downloading);
}

#[test]
fn test_user_cancel_is_immediately_terminal() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    f.outbox.drain();

    f.mgr.cancel(&id).unwrap();
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Cancelled);
    let all = f.outbox.drain();
    assert!(all.iter().any(|e| e["event"] == "download_control" && e["action"] == "cancel"));
    assert_eq!(all.iter().filter(|e| e["event"] == "notification").count(), 1);

    // The engine confirms later; that duplicate is ignored
    f.mgr.on_state_changed(&id, EngineDownloadState::Cancelled);
    assert!(events(&f.outbox, "notification").is_empty());
}

#[test]
fn test_interrupted_and_failed_are_terminal() {
    let mut f = setup();
    let a = request(&mut f, "a.bin", None);
    let b = request(&mut f, "b.bin", None);
    f.mgr.on_state_changed(&a, EngineDownloadState::Interrupted);
    f.mgr.on_state_changed(&b, EngineDownloadState::Failed);
    assert_eq!(f.mgr.get(&a).unwrap().state, DownloadState::Interrupted);
    assert_eq!(f.mgr.get(&b).unwrap().state, DownloadState::Failed);
    assert_eq!(history(&f.tmp).len(), 2);
}

#[test]
fn test_handle_released_at_terminal_transition() {
    let mut f = setup();
    let dropped = Rc::new(Cell::new(false));
    let id = f
        .mgr
        .on_download_requested("a.bin", None, Box::new(DropProbe(dropped.clone())));
    f.mgr.pause(&id).unwrap();
    assert!(!dropped.get());
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);
    assert!(dropped.get());
}

#[test]
fn test_completed_keeps_received_bytes() {
    let mut f = setup();
    let dropped = Rc::new(Cell::new(false));
    let id = f
        .mgr
        .on_download_requested("big.iso", Some(1000), Box::new(DropProbe(dropped.clone())));
    f.mgr.on_progress(&id, 200, None);
    f.mgr.on_progress(&id, 600, None);
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);

    let record = f.mgr.get(&id).unwrap();
    assert_eq!(record.state, DownloadState::Completed);
    assert_eq!(record.received_bytes, 600);
    assert_eq!(record.total_bytes, Some(1000));
    assert!(dropped.get());

    let stored = history(&f.tmp);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].received_bytes, 600);
}

// ─── Invalid actions ───

#[test]
fn test_invalid_transitions_are_rejected() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    assert!(matches!(f.mgr.resume(&id), Err(DownloadError::InvalidTransition { .. })));
    assert!(matches!(f.mgr.remove(&id), Err(DownloadError::InvalidTransition { .. })));

    f.mgr.pause(&id).unwrap();
    assert!(matches!(f.mgr.pause(&id), Err(DownloadError::InvalidTransition { .. })));

    f.mgr.cancel(&id).unwrap();
    assert!(matches!(f.mgr.cancel(&id), Err(DownloadError::InvalidTransition { .. })));
    assert_eq!(f.mgr.get(&id).unwrap().state, DownloadState::Cancelled);
}

#[test]
fn test_unknown_id_is_not_found() {
    let mut f = setup();
    assert_eq!(f.mgr.pause("nope"), Err(DownloadError::NotFound("nope".to_string())));
    assert_eq!(f.mgr.show("nope"), Err(DownloadError::NotFound("nope".to_string())));
    // Engine events for unknown ids are silently dropped
    f.mgr.on_progress("nope", 10, None);
    f.mgr.on_state_changed("nope", EngineDownloadState::Completed);
    assert!(f.mgr.list().is_empty());
}

// ─── Remove / show ───

#[test]
fn test_remove_finished_download() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", Some(1));
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);
    f.mgr.remove(&id).unwrap();
    assert!(f.mgr.get(&id).is_none());
    assert!(history(&f.tmp).is_empty());
}

#[test]
fn test_show_returns_containing_folder() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    assert_eq!(f.mgr.show(&id).unwrap(), f.tmp.path().join("Downloads"));
}

// ─── Bulk actions ───

#[test]
fn test_pause_all_and_resume_all() {
    let mut f = setup();
    let a = request(&mut f, "a.bin", None);
    let b = request(&mut f, "b.bin", None);
    let done = request(&mut f, "done.bin", None);
    f.mgr.on_state_changed(&done, EngineDownloadState::Completed);
    assert!(f.mgr.has_active_downloads());

    f.mgr.pause_all();
    assert!(!f.mgr.has_active_downloads());
    assert_eq!(f.mgr.get(&a).unwrap().state, DownloadState::Paused);
    assert_eq!(f.mgr.get(&b).unwrap().state, DownloadState::Paused);
    assert_eq!(f.mgr.get(&done).unwrap().state, DownloadState::Completed);

    f.mgr.resume_all();
    assert_eq!(f.mgr.get(&a).unwrap().state, DownloadState::Downloading);
    assert!(f.mgr.has_active_downloads());
}

// ─── Notifications ───

#[test]
fn test_every_transition_notifies() {
    let mut f = setup();
    let id = request(&mut f, "a.zip", None);
    f.mgr.pause(&id).unwrap();
    f.mgr.resume(&id).unwrap();
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);

    let all = f.outbox.drain();
    let notes: Vec<&str> = all
        .iter()
        .filter(|e| e["event"] == "notification")
        .filter_map(|e| e["text"].as_str())
        .collect();
    assert_eq!(
        notes,
        vec![
            "Download started: a.zip",
            "Download paused: a.zip",
            "Download resumed: a.zip",
            "Download completed: a.zip",
        ]
    );
    assert_eq!(all.iter().filter(|e| e["event"] == "downloads_changed").count(), 4);
}

#[test]
fn test_disabled_notifications_keep_refresh_signal() {
    let mut f = setup();
    f.settings
        .borrow_mut()
        .set(keys::NOTIFICATIONS, json!("disable"))
        .unwrap();
    let id = request(&mut f, "a.zip", None);
    f.mgr.on_state_changed(&id, EngineDownloadState::Completed);

    let all = f.outbox.drain();
    assert!(all.iter().all(|e| e["event"] != "notification"));
    assert_eq!(all.iter().filter(|e| e["event"] == "downloads_changed").count(), 2);
}

// ─── Persistence across restarts ───

#[test]
fn test_restart_keeps_only_finished_downloads() {
    let mut f = setup();
    let done = request(&mut f, "done.bin", Some(3));
    let _running = request(&mut f, "running.bin", None);
    f.mgr.on_state_changed(&done, EngineDownloadState::Completed);

    let Fixture { tmp, .. } = f;
    let reopened = open(tmp, EventOutbox::new());
    assert_eq!(reopened.mgr.list().len(), 1);
    assert_eq!(reopened.mgr.list()[0].id, done);
    assert_eq!(reopened.mgr.list()[0].state, DownloadState::Completed);
}

#[test]
fn test_history_ignores_non_terminal_entries_on_disk() {
    let tmp = TempDir::new().unwrap();
    let raw = json!([
        {"id": "1", "name": "a", "total": 5, "received": 5, "state": "completed", "path": "/x/a"},
        {"id": "2", "name": "b", "total": null, "received": 1, "state": "downloading", "path": "/x/b"},
    ]);
    fs::write(tmp.path().join("downloads.json"), raw.to_string()).unwrap();
    let f = open(tmp, EventOutbox::new());
    assert_eq!(f.mgr.list().len(), 1);
    assert_eq!(f.mgr.list()[0].id, "1");
}

#[test]
fn test_settings_path_is_in_temp_dir() {
    let f = setup();
    assert!(f.settings.borrow().get_config_path().starts_with(f.tmp.path()));
}
