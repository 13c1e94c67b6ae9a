// Dark Browser state managers
// Managers handle stateful operations: tabs, sessions, favorites and pins, downloads.

pub mod download_manager;
pub mod favorites_manager;
pub mod session_manager;
pub mod tab_manager;
