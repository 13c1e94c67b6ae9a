// Dark Browser shared type definitions
// Each submodule defines types used across the application.

pub mod download;
pub mod errors;
pub mod favorite;
pub mod session;
pub mod settings;
pub mod tab;
