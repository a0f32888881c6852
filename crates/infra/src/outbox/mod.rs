//! Transactional outbox.
//!
//! A message is written in the same transaction as the state change it
//! describes. After commit the handler invokes the returned [`SendFn`] once;
//! a message that fails to publish stays pending for redelivery.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use catalog_events::{Event, EventBus, EventEnvelope};

use crate::context::RequestContext;
use crate::store::{InMemoryDatabase, StoreError, Transaction};

/// Serialized event ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub event_id: Uuid,
    pub event_type: String,
    /// Ordering key for the transport (subject aggregate id).
    pub partition_key: String,
    pub payload: JsonValue,
}

impl OutboxMessage {
    pub fn from_envelope<E: Event>(envelope: &EventEnvelope<E>) -> Result<Self, StoreError> {
        let payload = serde_json::to_value(envelope)
            .map_err(|e| StoreError::Outbox(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id: envelope.event_id(),
            event_type: envelope.event_type().to_string(),
            partition_key: envelope.partition_key(),
            payload,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Delivered,
}

/// A stored outbox row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    pub message: OutboxMessage,
    pub status: OutboxStatus,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl OutboxRecord {
    fn pending(message: OutboxMessage) -> Self {
        Self {
            message,
            status: OutboxStatus::Pending,
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }
}

/// Delivered rows kept for inspection before the oldest is pruned.
pub const DELIVERED_RETENTION: usize = 1024;

/// Outbox rows in enqueue order, indexed by event id.
///
/// Pending rows are kept until delivered. Delivered rows are kept up to
/// [`DELIVERED_RETENTION`], so the table (and the copy every commit makes of
/// it) grows with the backlog rather than with history.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutboxTable {
    rows: BTreeMap<u64, OutboxRecord>,
    by_event: HashMap<Uuid, u64>,
    delivered: VecDeque<u64>,
    next_seq: u64,
}

impl OutboxTable {
    /// Rows oldest first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &OutboxRecord> {
        self.rows.values()
    }

    fn insert(&mut self, record: OutboxRecord) -> Result<(), StoreError> {
        let event_id = record.message.event_id;
        if self.by_event.contains_key(&event_id) {
            return Err(StoreError::Outbox(format!("duplicate event id {event_id}")));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_event.insert(event_id, seq);
        self.rows.insert(seq, record);
        Ok(())
    }

    fn mark_attempt(&mut self, event_id: Uuid, error: Option<String>) {
        let Some(&seq) = self.by_event.get(&event_id) else {
            return;
        };
        let Some(record) = self.rows.get_mut(&seq) else {
            return;
        };

        record.attempts += 1;
        let newly_delivered = error.is_none() && record.status == OutboxStatus::Pending;
        if error.is_none() {
            record.status = OutboxStatus::Delivered;
        }
        record.last_error = error;

        if newly_delivered {
            self.delivered.push_back(seq);
            while self.delivered.len() > DELIVERED_RETENTION {
                if let Some(oldest) = self.delivered.pop_front() {
                    self.prune(oldest);
                }
            }
        }
    }

    fn prune(&mut self, seq: u64) {
        if let Some(record) = self.rows.remove(&seq) {
            self.by_event.remove(&record.message.event_id);
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutboxError {
    #[error("publish failed: {0}")]
    Publish(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type Deliver = Box<dyn FnOnce(&RequestContext) -> Result<(), OutboxError> + Send>;

/// Deferred, single-shot publish of one committed outbox message.
pub struct SendFn {
    event_id: Uuid,
    deliver: Deliver,
}

impl SendFn {
    pub fn new<F>(event_id: Uuid, deliver: F) -> Self
    where
        F: FnOnce(&RequestContext) -> Result<(), OutboxError> + Send + 'static,
    {
        Self {
            event_id,
            deliver: Box::new(deliver),
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn send(self, ctx: &RequestContext) -> Result<(), OutboxError> {
        (self.deliver)(ctx)
    }
}

impl core::fmt::Debug for SendFn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SendFn").field("event_id", &self.event_id).finish()
    }
}

/// Outbox contract: enqueue inside a transaction, send after commit.
pub trait Outbox: Send + Sync {
    fn create(&self, tx: &mut Transaction<'_>, message: OutboxMessage) -> Result<SendFn, StoreError>;
}

impl<O> Outbox for Arc<O>
where
    O: Outbox + ?Sized,
{
    fn create(&self, tx: &mut Transaction<'_>, message: OutboxMessage) -> Result<SendFn, StoreError> {
        (**self).create(tx, message)
    }
}

/// Outbox stored in an [`InMemoryDatabase`], publishing on an [`EventBus`].
#[derive(Debug)]
pub struct InMemoryOutbox<B> {
    db: Arc<InMemoryDatabase>,
    bus: Arc<B>,
}

impl<B> InMemoryOutbox<B> {
    pub fn new(db: Arc<InMemoryDatabase>, bus: Arc<B>) -> Self {
        Self { db, bus }
    }

    pub fn records(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        self.db.read(|t| t.outbox.iter().cloned().collect())
    }

    pub fn pending(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        self.db.read(|t| {
            t.outbox
                .iter()
                .filter(|r| r.status == OutboxStatus::Pending)
                .cloned()
                .collect()
        })
    }
}

impl<B> InMemoryOutbox<B>
where
    B: EventBus<OutboxMessage> + 'static,
{
    /// Publish every pending message once, oldest first. Returns how many
    /// were delivered; failures stay pending.
    pub fn redeliver_pending(&self, ctx: &RequestContext) -> Result<usize, StoreError> {
        let mut delivered = 0;
        for record in self.pending()? {
            ctx.ensure_active()?;
            let event_id = record.message.event_id;
            match deliver(&self.db, self.bus.as_ref(), ctx, record.message) {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(event_id = %event_id, error = %err, "redelivery failed"),
            }
        }
        Ok(delivered)
    }
}

impl<B> Outbox for InMemoryOutbox<B>
where
    B: EventBus<OutboxMessage> + 'static,
{
    fn create(&self, tx: &mut Transaction<'_>, message: OutboxMessage) -> Result<SendFn, StoreError> {
        tx.context().ensure_active()?;

        let event_id = message.event_id;
        let record = OutboxRecord::pending(message.clone());
        tx.stage(move |t| t.outbox.insert(record));

        let db = self.db.clone();
        let bus = self.bus.clone();
        Ok(SendFn::new(event_id, move |ctx| {
            deliver(&db, bus.as_ref(), ctx, message)
        }))
    }
}

fn deliver<B>(
    db: &InMemoryDatabase,
    bus: &B,
    ctx: &RequestContext,
    message: OutboxMessage,
) -> Result<(), OutboxError>
where
    B: EventBus<OutboxMessage>,
{
    let event_id = message.event_id;

    if ctx.is_cancelled() {
        tracing::debug!(event_id = %event_id, "send skipped, request cancelled");
        return Ok(());
    }

    match bus.publish(message) {
        Ok(()) => {
            db.write(|t| t.outbox.mark_attempt(event_id, None))?;
            Ok(())
        }
        Err(err) => {
            let reason = err.to_string();
            db.write(|t| t.outbox.mark_attempt(event_id, Some(reason.clone())))?;
            Err(OutboxError::Publish(reason))
        }
    }
}
