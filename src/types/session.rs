use serde::{Deserialize, Deserializer, Serialize, Serializer};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::warn;

use super::tab::TabType;

/// Complete session data for save/restore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionDescriptor {
    pub tabs: Vec<SessionTab>,
    #[serde(default)]
    pub active: usize,
    /// Opaque window geometry, stored base64-encoded.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_geometry",
        deserialize_with = "deserialize_geometry"
    )]
    pub geometry: Option<Vec<u8>>,
}

/// A tab's state as stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionTab {
    pub kind: TabType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
}

fn serialize_geometry<S: Serializer>(blob: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match blob {
        Some(bytes) => s.serialize_str(&BASE64.encode(bytes)),
        None => s.serialize_none(),
    }
}

fn deserialize_geometry<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
    let encoded: Option<String> = Option::deserialize(d)?;
    let Some(text) = encoded else {
        return Ok(None);
    };
    match BASE64.decode(text.as_bytes()) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable window geometry");
            Ok(None)
        }
    }
}
