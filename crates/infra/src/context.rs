//! Request-scoped context.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::store::StoreError;

/// Context for a single command invocation.
///
/// Cloning shares the cancellation flag, so a caller can keep a clone and
/// cancel the request from another thread.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(StoreError::Cancelled)` once the request was cancelled.
    pub fn ensure_active(&self) -> Result<(), StoreError> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
