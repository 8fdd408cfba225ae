use crate::status_payload::StatusPayload;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle on the latest controller status.
///
/// Readers get a whole snapshot, the fetcher swaps the payload in one go, so
/// a resolver never sees half of an old and half of a new payload.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    data: Arc<RwLock<Arc<StatusPayload>>>,
}

impl Coordinator {
    pub fn new(initial: StatusPayload) -> Self {
        Self {
            data: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Current payload snapshot.
    pub fn data(&self) -> Arc<StatusPayload> {
        // A writer can't leave the payload half written, so a poisoned lock is still usable
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the payload with a freshly fetched one.
    pub fn refresh(&self, payload: StatusPayload) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *data = Arc::new(payload);
    }
}
