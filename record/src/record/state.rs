use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{Record, RecordChange, RecordOptions, apply_change, initialize, merge, replace};

struct Slot {
    record:    Arc<Record>,
    is_synced: bool,
}

/// Holder of the current record snapshot
///
/// Every operation swaps in a new `Arc<Record>`; readers holding an older
/// snapshot keep a consistent view. Writers do not coordinate, the last write
/// wins.
pub struct RecordState {
    slot:    Mutex<Slot>,
    options: RecordOptions,
}

impl RecordState {
    /// Start from `initial`, or an empty unsaved record
    #[must_use]
    pub fn new(initial: Option<Record>, options: RecordOptions) -> Self {
        let record = options.filter(initialize(initial));
        Self {
            slot: Mutex::new(Slot {
                record:    Arc::new(record),
                is_synced: true,
            }),
            options,
        }
    }

    /// Switch to other options, refiltering the current snapshot
    ///
    /// The sync flag carries over: unsaved local edits stay unsaved.
    #[must_use]
    pub fn with_options(self, options: RecordOptions) -> Self {
        let slot = self
            .slot
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let record = options.filter(Arc::unwrap_or_clone(slot.record));
        Self {
            slot: Mutex::new(Slot {
                record:    Arc::new(record),
                is_synced: slot.is_synced,
            }),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // snapshots are swapped whole, a poisoned slot still holds a consistent record
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current snapshot
    pub fn current(&self) -> Arc<Record> {
        Arc::clone(&self.lock().record)
    }

    /// False once a local change has not yet been saved
    pub fn is_synced(&self) -> bool {
        self.lock().is_synced
    }

    /// Options this state was built with
    pub const fn options(&self) -> &RecordOptions {
        &self.options
    }

    /// Apply a local change and return the new snapshot
    pub fn apply(&self, change: RecordChange) -> Arc<Record> {
        let mut slot = self.lock();
        let next = Arc::new(apply_change(&slot.record, change));
        slot.record = Arc::clone(&next);
        slot.is_synced = false;
        drop(slot);
        next
    }

    /// Switch to a different record
    pub fn replace(&self, incoming: Record) -> Arc<Record> {
        let mut slot = self.lock();
        debug!(
            "Replacing record {:?} with {:?}",
            slot.record.id, incoming.id
        );
        let next = Arc::new(self.options.filter(replace(&slot.record, incoming)));
        slot.record = Arc::clone(&next);
        slot.is_synced = true;
        drop(slot);
        next
    }

    /// Fold a server-returned record into the current snapshot
    pub fn merge_response(&self, server_record: Record) -> Arc<Record> {
        let mut slot = self.lock();
        let next = Arc::new(self.options.filter(merge(&slot.record, server_record)));
        slot.record = Arc::clone(&next);
        slot.is_synced = true;
        drop(slot);
        next
    }
}
