//! Dark Browser: core of a minimal tabbed web browser.
//!
//! The crate owns tab, session, download and settings state and talks to the
//! render engine and window through the traits in [`host`]. This library
//! crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod host;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
pub mod ui;
