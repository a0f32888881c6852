use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Metadata carried by every catalog event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub event_type: String,
    /// Emitting service name.
    pub source: String,
    pub timestamp: DateTime<Utc>,
    /// Request that caused the event.
    pub request_id: Uuid,
}

/// Envelope for an event: metadata plus typed payload.
///
/// This is the unit serialized into the outbox and handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    metadata: EventMetadata,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload`, assigning a fresh time-ordered event id.
    pub fn new(source: impl Into<String>, request_id: Uuid, payload: E) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::now_v7(),
                event_type: payload.event_type().to_string(),
                source: source.into(),
                timestamp: Utc::now(),
                request_id,
            },
            payload,
        }
    }

    pub fn partition_key(&self) -> String {
        self.payload.partition_key()
    }
}

impl<E> EventEnvelope<E> {
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    pub fn event_id(&self) -> Uuid {
        self.metadata.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.metadata.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.metadata.timestamp
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
