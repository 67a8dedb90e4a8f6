//! Raw activity events as delivered by the events API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::event_kind::EventKind;
use crate::types::{ProjectKey, ValidationError};

/// Why an event could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not JSON, or not the event wire shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed JSON carrying a value the record rejects.
    #[error("invalid event: {0}")]
    Invalid(#[from] ValidationError),
}

/// One decoded platform event.
///
/// The payload is kept as JSON; only the classifier reads it, and only the
/// fields the event's kind guarantees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireEvent")]
pub struct EventRecord {
    /// The project the event targets.
    pub project_key: ProjectKey,
    /// The type of activity.
    pub kind: EventKind,
    /// When the event was created, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Kind-specific details.
    pub payload: serde_json::Value,
}

impl EventRecord {
    pub const fn new(
        project_key: ProjectKey,
        kind: EventKind,
        timestamp: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            project_key,
            kind,
            timestamp,
            payload,
        }
    }

    /// Decodes a record from one line of newline-delimited JSON.
    pub fn from_json_line(line: &str) -> Result<Self, DecodeError> {
        let wire: WireEvent = serde_json::from_str(line)?;
        Ok(Self::try_from(wire)?)
    }

    /// Decodes a record from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DecodeError> {
        let wire: WireEvent = serde_json::from_value(value)?;
        Ok(Self::try_from(wire)?)
    }
}

/// Shape of an event on the wire: `{"type", "repo": {"name"}, "created_at", "payload"}`.
#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    repo: WireRepo,
    created_at: DateTime<Utc>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireRepo {
    name: String,
}

impl TryFrom<WireEvent> for EventRecord {
    type Error = ValidationError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            project_key: ProjectKey::new(wire.repo.name)?,
            kind: wire.kind,
            timestamp: wire.created_at,
            payload: wire.payload,
        })
    }
}
