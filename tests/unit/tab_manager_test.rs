use serde_json::Value;
use tempfile::TempDir;

use darkbrowser::managers::session_manager::{SessionManager, SessionManagerTrait};
use darkbrowser::managers::tab_manager::{TabManager, TabManagerTrait};
use darkbrowser::services::settings_engine::{SettingsEngine, SharedSettings};
use darkbrowser::types::errors::TabError;
use darkbrowser::types::session::{SessionDescriptor, SessionTab};
use darkbrowser::types::tab::{LoadState, NavigationStep, Panel, PinOutcome, TabType, ViewId};
use darkbrowser::ui::event_bridge::{BridgeEngine, BridgeShell, EventOutbox, GeometryCell};

struct Fixture {
    mgr: TabManager,
    outbox: EventOutbox,
    settings: SharedSettings,
    _tmp: TempDir,
}

fn setup() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let settings = SettingsEngine::open_shared(Some(tmp.path().join("settings.json")));
    let outbox = EventOutbox::new();
    let mgr = TabManager::new(
        Box::new(BridgeEngine::new(outbox.clone())),
        Box::new(BridgeShell::new(outbox.clone(), GeometryCell::default())),
        settings.clone(),
    );
    Fixture { mgr, outbox, settings, _tmp: tmp }
}

fn events(outbox: &EventOutbox, name: &str) -> Vec<Value> {
    outbox.drain().into_iter().filter(|e| e["event"] == name).collect()
}

fn stored_session(settings: &SharedSettings) -> Option<SessionDescriptor> {
    SessionManager::new(settings.clone()).restore_session().unwrap()
}

fn web(url: &str, title: &str) -> SessionTab {
    SessionTab { kind: TabType::Web, url: Some(url.to_string()), title: title.to_string() }
}

fn panel(kind: TabType) -> SessionTab {
    SessionTab { kind, url: None, title: String::new() }
}

// ─── Creation ───

#[test]
fn test_create_web_tab_appends_and_activates() {
    let mut f = setup();
    let first = f.mgr.create_web_tab("https://a.com");
    let second = f.mgr.create_web_tab("https://b.com");
    assert_eq!((first, second), (0, 1));
    assert_eq!(f.mgr.active_index(), Some(1));

    let tab = f.mgr.tab(1).unwrap();
    assert_eq!(tab.kind, TabType::Web);
    assert_eq!(tab.title, "Loading...");
    assert_eq!(tab.url.as_deref(), Some("https://b.com"));
    assert_eq!(tab.load_state, Some(LoadState::Loading));
    assert!(tab.active);
}

#[test]
fn test_create_web_tab_loads_url_in_engine() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    let loads = events(&f.outbox, "view_load");
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0]["url"], "https://a.com");
}

#[test]
fn test_create_panel_tab_does_not_dedupe() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Settings);
    f.mgr.create_panel_tab(Panel::Settings);
    assert_eq!(f.mgr.tab_count(), 2);
    assert_eq!(f.mgr.tab(0).unwrap().title, "Settings");
    assert_eq!(f.mgr.tab(0).unwrap().url, None);
}

#[test]
fn test_panel_address_uses_internal_scheme() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Downloads);
    let addresses = events(&f.outbox, "address");
    assert_eq!(addresses.last().unwrap()["text"], "dark://downloads");
}

// ─── openUrl routing ───

#[test]
fn test_open_internal_url_dedupes_panel() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.open_url("dark://settings");
    f.mgr.create_web_tab("https://b.com");
    f.mgr.open_url("dark://settings");
    assert_eq!(f.mgr.tab_count(), 3);
    assert_eq!(f.mgr.active_index(), Some(1));
    assert_eq!(f.mgr.tab(1).unwrap().kind, TabType::Settings);
}

#[test]
fn test_open_internal_url_ignores_query() {
    let mut f = setup();
    f.mgr.open_url("dark://downloads?action=show&id=x");
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(f.mgr.tab(0).unwrap().kind, TabType::Downloads);
}

#[test]
fn test_open_unknown_panel_is_noop() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.open_url("dark://nowhere");
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(f.mgr.active_index(), Some(0));
}

#[test]
fn test_open_url_promotes_home_in_place() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Home);
    f.mgr.open_url("https://a.com");
    assert_eq!(f.mgr.tab_count(), 1);
    let tab = f.mgr.tab(0).unwrap();
    assert_eq!(tab.kind, TabType::Web);
    assert_eq!(tab.url.as_deref(), Some("https://a.com"));
    assert_eq!(f.mgr.active_index(), Some(0));
}

#[test]
fn test_open_url_from_settings_opens_new_tab() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Settings);
    f.mgr.open_url("https://a.com");
    assert_eq!(f.mgr.tab_count(), 2);
    assert_eq!(f.mgr.tab(0).unwrap().kind, TabType::Settings);
    assert_eq!(f.mgr.active_index(), Some(1));
}

#[test]
fn test_open_url_navigates_web_tab_in_place() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.outbox.drain();
    f.mgr.open_url("https://b.com");
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(f.mgr.tab(0).unwrap().url.as_deref(), Some("https://b.com"));

    let all = f.outbox.drain();
    assert!(all.iter().all(|e| e["event"] != "view_created"));
    assert!(all.iter().any(|e| e["event"] == "view_load" && e["url"] == "https://b.com"));
}

#[test]
fn test_open_url_without_tabs_creates_web_tab() {
    let mut f = setup();
    f.mgr.open_url("https://a.com");
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(f.mgr.tab(0).unwrap().kind, TabType::Web);
}

#[test]
fn test_navigate_input_searches_plain_text() {
    let mut f = setup();
    f.mgr.navigate_input("rust borrow");
    let url = f.mgr.tab(0).unwrap().url.unwrap();
    assert_eq!(url, "https://www.google.com/search?q=rust%20borrow");
}

#[test]
fn test_navigate_input_blank_is_ignored() {
    let mut f = setup();
    f.mgr.navigate_input("   ");
    assert_eq!(f.mgr.tab_count(), 0);
}

// ─── Closing ───

#[test]
fn test_close_tab_scenario() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Home);
    f.mgr.create_web_tab("https://a.com");
    f.mgr.create_web_tab("https://b.com");
    assert_eq!(f.mgr.active_index(), Some(2));

    f.mgr.close_tab(2);
    assert_eq!(f.mgr.tab_count(), 2);
    assert_eq!(f.mgr.active_index(), Some(1));

    f.mgr.close_tab(0);
    assert_eq!(f.mgr.active_index(), Some(0));
    assert_eq!(f.mgr.tab(0).unwrap().url.as_deref(), Some("https://a.com"));

    f.outbox.drain();
    f.mgr.close_tab(0);
    assert_eq!(f.mgr.tab_count(), 0);
    assert_eq!(f.mgr.active_index(), None);
    assert_eq!(events(&f.outbox, "close_window").len(), 1);
    assert!(stored_session(&f.settings).unwrap().tabs.is_empty());
}

#[test]
fn test_close_tab_destroys_view() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.create_panel_tab(Panel::Home);
    f.outbox.drain();
    f.mgr.close_tab(0);
    let destroyed = events(&f.outbox, "view_destroyed");
    assert_eq!(destroyed.len(), 1);
    assert_eq!(destroyed[0]["view"], 1);
}

#[test]
fn test_close_invalid_index_is_noop() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.close_tab(5);
    assert_eq!(f.mgr.tab_count(), 1);
}

#[test]
fn test_set_active_out_of_range_is_noop() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.create_web_tab("https://b.com");
    f.mgr.set_active(7);
    assert_eq!(f.mgr.active_index(), Some(1));
    f.mgr.set_active(0);
    assert_eq!(f.mgr.active_index(), Some(0));
}

#[test]
fn test_set_active_persists_session() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.create_web_tab("https://b.com");
    f.mgr.set_active(0);
    assert_eq!(stored_session(&f.settings).unwrap().active, 0);
}

// ─── Duplicate / pin / favorite ───

#[test]
fn test_duplicate_web_tab() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    let copy = f.mgr.duplicate_tab(0).unwrap();
    assert_eq!(copy, 1);
    assert_eq!(f.mgr.tab(1).unwrap().url.as_deref(), Some("https://a.com"));
    assert_eq!(f.mgr.active_index(), Some(1));
}

#[test]
fn test_duplicate_panel_opens_home() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Downloads);
    f.mgr.duplicate_tab(0);
    assert_eq!(f.mgr.tab(1).unwrap().kind, TabType::Home);
    assert_eq!(f.mgr.duplicate_tab(9), None);
}

#[test]
fn test_toggle_pin_only_on_web_tabs() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Home);
    assert_eq!(f.mgr.toggle_pin(0), PinOutcome::NotApplicable);
    assert_eq!(f.mgr.toggle_pin(3), PinOutcome::NotApplicable);
}

#[test]
fn test_toggle_pin_round_trip() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    assert_eq!(f.mgr.toggle_pin(0), PinOutcome::Pinned);
    assert!(f.mgr.tab(0).unwrap().pinned);
    assert_eq!(f.mgr.toggle_pin(0), PinOutcome::Unpinned);
    assert!(!f.mgr.tab(0).unwrap().pinned);
}

#[test]
fn test_toggle_pin_limit_shows_warning() {
    let mut f = setup();
    // Three pins ship by default
    for i in 0..6 {
        f.mgr.create_web_tab(&format!("https://site{}.com", i));
        assert_eq!(f.mgr.toggle_pin(i), PinOutcome::Pinned);
    }
    f.mgr.create_web_tab("https://one-too-many.com");
    f.outbox.drain();
    assert_eq!(f.mgr.toggle_pin(6), PinOutcome::LimitReached);
    let messages = events(&f.outbox, "message");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Maximum 9 pins allowed");
    assert_eq!(f.mgr.favorites().pinned_sites().len(), 9);
}

#[test]
fn test_toggle_favorite() {
    let mut f = setup();
    f.mgr.create_panel_tab(Panel::Home);
    f.mgr.create_web_tab("https://a.com");
    assert_eq!(f.mgr.toggle_favorite(0), Err(TabError::NotWebTab(0)));
    assert_eq!(f.mgr.toggle_favorite(4), Err(TabError::InvalidIndex(4)));
    assert_eq!(f.mgr.toggle_favorite(1), Ok(true));
    assert!(f.mgr.tab(1).unwrap().favorite);
    assert_eq!(f.mgr.toggle_favorite(1), Ok(false));
    assert!(!f.mgr.tab(1).unwrap().favorite);
}

#[test]
fn test_favorite_flag_follows_url() {
    let mut f = setup();
    f.mgr.add_favorite("https://b.com", "B");
    f.mgr.create_web_tab("https://a.com");
    assert!(!f.mgr.tab(0).unwrap().favorite);
    f.mgr.on_url_changed(ViewId(1), "https://b.com");
    assert!(f.mgr.tab(0).unwrap().favorite);
}

// ─── Engine events ───

#[test]
fn test_empty_title_becomes_new_tab() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.on_title_changed(ViewId(1), "Example");
    assert_eq!(f.mgr.tab(0).unwrap().title, "Example");
    f.mgr.on_title_changed(ViewId(1), "  ");
    assert_eq!(f.mgr.tab(0).unwrap().title, "New Tab");
}

#[test]
fn test_url_change_updates_address_and_session() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.outbox.drain();
    f.mgr.on_url_changed(ViewId(1), "https://a.com/next");
    let addresses = events(&f.outbox, "address");
    assert_eq!(addresses.last().unwrap()["text"], "https://a.com/next");
    let session = stored_session(&f.settings).unwrap();
    assert_eq!(session.tabs[0].url.as_deref(), Some("https://a.com/next"));
}

#[test]
fn test_url_change_on_background_tab_keeps_address() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.create_web_tab("https://b.com");
    f.outbox.drain();
    f.mgr.on_url_changed(ViewId(1), "https://a.com/next");
    assert!(events(&f.outbox, "address").is_empty());
    assert_eq!(f.mgr.tab(0).unwrap().url.as_deref(), Some("https://a.com/next"));
}

#[test]
fn test_load_failures_are_visible() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.on_load_finished(ViewId(1), true);
    assert_eq!(f.mgr.tab(0).unwrap().load_state, Some(LoadState::Loaded));
    f.mgr.on_load_finished(ViewId(1), false);
    assert!(matches!(f.mgr.tab(0).unwrap().load_state, Some(LoadState::Failed(_))));
    f.mgr.on_render_crashed(ViewId(1));
    assert_eq!(f.mgr.tab(0).unwrap().load_state, Some(LoadState::Crashed));
    assert_eq!(f.mgr.tab_count(), 1);
}

#[test]
fn test_events_for_unknown_view_are_ignored() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.on_title_changed(ViewId(42), "Ghost");
    f.mgr.on_render_crashed(ViewId(42));
    assert_eq!(f.mgr.tab(0).unwrap().title, "Loading...");
}

#[test]
fn test_reload_marks_loading() {
    let mut f = setup();
    f.mgr.create_web_tab("https://a.com");
    f.mgr.on_load_finished(ViewId(1), true);
    f.outbox.drain();
    f.mgr.navigate(NavigationStep::Reload);
    assert_eq!(f.mgr.tab(0).unwrap().load_state, Some(LoadState::Loading));
    let steps = events(&f.outbox, "view_navigate");
    assert_eq!(steps[0]["step"], "reload");
}

// ─── Session restore ───

#[test]
fn test_restore_rebuilds_tabs() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![panel(TabType::Home), web("https://a.com", "A"), panel(TabType::Settings)],
        active: 1,
        geometry: None,
    };
    f.mgr.restore_session(Some(descriptor));
    assert_eq!(f.mgr.tab_count(), 3);
    assert_eq!(f.mgr.active_index(), Some(1));
    assert_eq!(f.mgr.tab(1).unwrap().title, "A");
    assert_eq!(f.mgr.tab(2).unwrap().title, "Settings");
    assert!(f.mgr.has_pending_reload());
}

#[test]
fn test_restore_persists_only_on_commit() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![web("https://a.com", "A"), web("https://b.com", "B")],
        active: 0,
        geometry: None,
    };
    let restore = f.mgr.begin_restore(descriptor);
    assert_eq!(restore.tab_count(), 2);
    assert_eq!(stored_session(&f.settings), None);

    assert_eq!(restore.commit(1), 1);
    let stored = stored_session(&f.settings).unwrap();
    assert_eq!(stored.tabs.len(), 2);
    assert_eq!(stored.active, 1);
}

#[test]
fn test_restore_active_out_of_range_selects_last() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![web("https://a.com", "A"), panel(TabType::Downloads)],
        active: 10,
        geometry: None,
    };
    f.mgr.restore_session(Some(descriptor));
    assert_eq!(f.mgr.active_index(), Some(1));
}

#[test]
fn test_restore_missing_or_empty_session_opens_home() {
    let mut f = setup();
    f.mgr.restore_session(None);
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(f.mgr.tab(0).unwrap().kind, TabType::Home);

    let mut g = setup();
    g.mgr.restore_session(Some(SessionDescriptor::default()));
    assert_eq!(g.mgr.tab_count(), 1);
    assert_eq!(g.mgr.tab(0).unwrap().kind, TabType::Home);
    assert!(!g.mgr.has_pending_reload());
}

#[test]
fn test_restore_web_entry_without_url_becomes_home() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![SessionTab { kind: TabType::Web, url: None, title: "Lost".into() }],
        active: 0,
        geometry: None,
    };
    f.mgr.restore_session(Some(descriptor));
    assert_eq!(f.mgr.tab(0).unwrap().kind, TabType::Home);
}

#[test]
fn test_restore_applies_geometry() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![panel(TabType::Home)],
        active: 0,
        geometry: Some(vec![9, 8, 7]),
    };
    f.mgr.restore_session(Some(descriptor));
    assert_eq!(events(&f.outbox, "restore_geometry").len(), 1);
    assert_eq!(f.mgr.export_session().geometry, Some(vec![9, 8, 7]));
}

#[test]
fn test_reload_restored_tabs_runs_once() {
    let mut f = setup();
    let descriptor = SessionDescriptor {
        tabs: vec![web("https://a.com", "A"), panel(TabType::Home), web("https://b.com", "B")],
        active: 0,
        geometry: None,
    };
    f.mgr.restore_session(Some(descriptor));
    f.outbox.drain();

    f.mgr.reload_restored_tabs();
    assert_eq!(events(&f.outbox, "view_load").len(), 2);
    assert!(!f.mgr.has_pending_reload());

    f.mgr.reload_restored_tabs();
    assert!(events(&f.outbox, "view_load").is_empty());
}

#[test]
fn test_restore_replaces_existing_tabs() {
    let mut f = setup();
    f.mgr.create_web_tab("https://old.com");
    f.outbox.drain();
    let descriptor = SessionDescriptor { tabs: vec![panel(TabType::Home)], active: 0, geometry: None };
    f.mgr.restore_session(Some(descriptor));
    assert_eq!(f.mgr.tab_count(), 1);
    assert_eq!(events(&f.outbox, "view_destroyed").len(), 1);
}
