//! Per-entry exclusive access.
//!
//! Each entry id maps to an async mutex that lives only while someone holds
//! or waits for it. Operations on different ids never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use qabase_shared::EntryId;
use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub(crate) struct EntryLocks {
    slots: Arc<Mutex<HashMap<EntryId, Slot>>>,
}

impl EntryLocks {
    /// Wait for exclusive access to `id`.
    pub(crate) async fn lock(&self, id: &EntryId) -> EntryGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(id.clone()).or_default())
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        EntryGuard {
            id: id.clone(),
            slot,
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of one operation on one entry.
pub(crate) struct EntryGuard {
    id: EntryId,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<Mutex<HashMap<EntryId, Slot>>>,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still reference the slot: nobody waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.id);
        }
    }
}
