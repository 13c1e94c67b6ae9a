//! Session Manager for Dark Browser.
//!
//! Saves and restores the browser session (open tabs, active index, window
//! geometry) as JSON under the `session` settings key.

use serde_json::Value;
use tracing::{debug, warn};

use crate::services::settings_engine::{SettingsEngineTrait, SharedSettings};
use crate::types::errors::SessionError;
use crate::types::session::SessionDescriptor;
use crate::types::settings::keys;

/// Trait defining session management operations.
pub trait SessionManagerTrait {
    fn save_session(&self, data: &SessionDescriptor) -> Result<(), SessionError>;
    fn restore_session(&self) -> Result<Option<SessionDescriptor>, SessionError>;
    fn has_session(&self) -> bool;
    fn clear_session(&self) -> Result<(), SessionError>;
}

/// Session manager backed by the settings store.
pub struct SessionManager {
    settings: SharedSettings,
}

impl SessionManager {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    /// Reads the stored session, treating malformed data as absent.
    pub fn load_or_none(&self) -> Option<SessionDescriptor> {
        match self.restore_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, starting fresh");
                None
            }
        }
    }
}

impl SessionManagerTrait for SessionManager {
    fn save_session(&self, data: &SessionDescriptor) -> Result<(), SessionError> {
        let value = serde_json::to_value(data)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;

        debug!(tabs = data.tabs.len(), active = data.active, "Saving session");
        self.settings
            .borrow_mut()
            .set(keys::SESSION, value)
            .map_err(|e| SessionError::PersistenceError(e.to_string()))
    }

    fn restore_session(&self) -> Result<Option<SessionDescriptor>, SessionError> {
        let settings = self.settings.borrow();
        match settings.get(keys::SESSION) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value::<SessionDescriptor>(value.clone())
                .map(Some)
                .map_err(|e| SessionError::SerializationError(e.to_string())),
        }
    }

    fn has_session(&self) -> bool {
        matches!(self.restore_session(), Ok(Some(ref s)) if !s.tabs.is_empty())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        self.settings
            .borrow_mut()
            .set(keys::SESSION, Value::Null)
            .map_err(|e| SessionError::PersistenceError(e.to_string()))
    }
}
