use carebase_core::ResourceRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Lifecycle transition carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
}

impl ChangeKind {
    /// Name of the event on the realtime channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChangeKind::Created => "resourceCreated",
        }
    }
}

/// A record lifecycle notification. Ephemeral: never persisted or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: ResourceRecord,
}

impl ChangeEvent {
    pub fn created(record: ResourceRecord) -> Self {
        Self {
            kind: ChangeKind::Created,
            record,
        }
    }

    pub fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }

    /// Frame sent to realtime clients: `{"event": "resourceCreated", "data": {...}}`.
    pub fn to_wire(&self) -> Value {
        json!({
            "event": self.event_name(),
            "data": self.record,
        })
    }
}
