// Dark Browser platform paths for macOS
// Config:    ~/Library/Application Support/DarkBrowser
// Data:      ~/Library/Application Support/DarkBrowser
// Downloads: ~/Downloads

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

pub fn get_config_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("DarkBrowser")
}

pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}

pub fn get_downloads_dir() -> PathBuf {
    home_dir().join("Downloads")
}
