//! Event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a new event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The event type namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "migration.started")]
    MigrationStarted,
    #[serde(rename = "migration.progress")]
    MigrationProgress,
    #[serde(rename = "migration.file_completed")]
    MigrationFileCompleted,
    #[serde(rename = "migration.file_failed")]
    MigrationFileFailed,
    #[serde(rename = "migration.completed")]
    MigrationCompleted,
    #[serde(rename = "migration.failed")]
    MigrationFailed,
    #[serde(rename = "migration.cancelled")]
    MigrationCancelled,
    #[serde(rename = "catalog.refresh_started")]
    CatalogRefreshStarted,
    #[serde(rename = "catalog.refresh_completed")]
    CatalogRefreshCompleted,
    #[serde(rename = "placement.recommendations_updated")]
    PlacementRecommendationsUpdated,
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

impl EventKind {
    /// Dotted wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MigrationStarted => "migration.started",
            EventKind::MigrationProgress => "migration.progress",
            EventKind::MigrationFileCompleted => "migration.file_completed",
            EventKind::MigrationFileFailed => "migration.file_failed",
            EventKind::MigrationCompleted => "migration.completed",
            EventKind::MigrationFailed => "migration.failed",
            EventKind::MigrationCancelled => "migration.cancelled",
            EventKind::CatalogRefreshStarted => "catalog.refresh_started",
            EventKind::CatalogRefreshCompleted => "catalog.refresh_completed",
            EventKind::PlacementRecommendationsUpdated => "placement.recommendations_updated",
            EventKind::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only domain event. Never mutated after publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    #[serde(rename = "type")]
    pub kind: EventKind,

    pub timestamp: DateTime<Utc>,

    /// Type-specific record.
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The `job_id` payload field, when present.
    pub fn job_id(&self) -> Option<&str> {
        self.payload.get("job_id").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::MigrationFileCompleted.as_str(), "migration.file_completed");
        assert_eq!(
            serde_json::to_string(&EventKind::Heartbeat).unwrap(),
            "\"heartbeat\""
        );
    }

    #[test]
    fn test_event_serializes_type_field() {
        let event = Event::new(
            EventKind::MigrationStarted,
            serde_json::json!({ "job_id": "j-1" }),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "migration.started");
        assert_eq!(event.job_id(), Some("j-1"));
    }
}
