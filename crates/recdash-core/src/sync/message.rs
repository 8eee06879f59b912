//! Event channel message types
//!
//! Frames from the recorder are JSON objects with a `type` discriminator and a
//! `data` payload. Outbound traffic is only the heartbeat text.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ClientResult;
use crate::models::{StatusRecord, StatusTable};

/// Heartbeat payload sent while the connection is open
pub const HEARTBEAT: &str = "ping";

/// Discriminator of status pushes
pub const STATUS_UPDATE: &str = "status_update";

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// New snapshot of the status table
    StatusUpdate(StatusTable),
    /// A message type we don't handle
    Other(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl ServerEvent {
    /// Decode a text frame
    ///
    /// Fails only when the frame isn't JSON at all.
    pub fn parse(text: &str) -> ClientResult<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;

        if envelope.kind != STATUS_UPDATE {
            return Ok(ServerEvent::Other(envelope.kind));
        }

        Ok(ServerEvent::StatusUpdate(status_table(envelope.data)))
    }
}

/// Extract the status table from a `status_update` payload
///
/// Prefers `data.recording`; falls back to `data` when it's missing or null.
fn status_table(mut data: Value) -> StatusTable {
    let nested = data
        .as_object_mut()
        .and_then(|object| object.remove("recording"));
    let mapping = match nested {
        Some(nested) if !nested.is_null() => nested,
        _ => data,
    };

    let Value::Object(entries) = mapping else {
        debug!("status_update without a mapping, treating as empty");
        return StatusTable::new();
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<StatusRecord>(value) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                debug!("Skipping status entry {}: {}", key, e);
                None
            }
        })
        .collect()
}
