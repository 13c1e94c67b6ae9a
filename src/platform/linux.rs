// Dark Browser platform paths for Linux
// Config:    ~/.config/darkbrowser
// Data:      ~/.local/share/darkbrowser
// Downloads: $XDG_DOWNLOAD_DIR or ~/Downloads

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/darkbrowser` if set, otherwise `~/.config/darkbrowser`.
pub fn get_config_dir() -> PathBuf {
    xdg_or(env::var("XDG_CONFIG_HOME").ok(), &[".config"])
}

/// Uses `$XDG_DATA_HOME/darkbrowser` if set, otherwise `~/.local/share/darkbrowser`.
pub fn get_data_dir() -> PathBuf {
    xdg_or(env::var("XDG_DATA_HOME").ok(), &[".local", "share"])
}

pub fn get_downloads_dir() -> PathBuf {
    match env::var("XDG_DOWNLOAD_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join("Downloads"),
    }
}

fn xdg_or(xdg: Option<String>, fallback: &[&str]) -> PathBuf {
    match xdg {
        Some(base) if !base.is_empty() => PathBuf::from(base).join("darkbrowser"),
        _ => {
            let mut path = home_dir();
            for part in fallback {
                path.push(part);
            }
            path.join("darkbrowser")
        }
    }
}
