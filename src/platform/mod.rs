// Dark Browser platform abstraction
// Provides platform-specific paths for Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time. Each directory can be
// overridden through an environment variable.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as os;
#[cfg(target_os = "macos")]
use macos as os;
#[cfg(target_os = "windows")]
use windows as os;

pub const CONFIG_DIR_ENV: &str = "DARKBROWSER_CONFIG_DIR";
pub const DATA_DIR_ENV: &str = "DARKBROWSER_DATA_DIR";
pub const DOWNLOAD_DIR_ENV: &str = "DARKBROWSER_DOWNLOAD_DIR";

fn env_dir(var: &str) -> Option<PathBuf> {
    env::var(var).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the configuration directory, where `settings.json` lives.
///
/// - **Linux**: `~/.config/darkbrowser` (or `$XDG_CONFIG_HOME/darkbrowser`)
/// - **macOS**: `~/Library/Application Support/DarkBrowser`
/// - **Windows**: `%APPDATA%/DarkBrowser`
pub fn get_config_dir() -> PathBuf {
    env_dir(CONFIG_DIR_ENV).unwrap_or_else(os::get_config_dir)
}

/// Returns the data directory, where the download history lives.
///
/// - **Linux**: `~/.local/share/darkbrowser` (or `$XDG_DATA_HOME/darkbrowser`)
/// - **macOS** / **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    env_dir(DATA_DIR_ENV).unwrap_or_else(os::get_data_dir)
}

/// Returns the directory downloads are saved into.
pub fn get_downloads_dir() -> PathBuf {
    env_dir(DOWNLOAD_DIR_ENV).unwrap_or_else(os::get_downloads_dir)
}
