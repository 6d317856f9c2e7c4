use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::transport::UploadProgress;

/// Observer told about every change of the recorded upload percentage
pub type ProgressListener = Arc<dyn Fn(u8) + Send + Sync>;

/// Bits of the packed state holding the percentage; the rest is the generation
const PERCENT_BITS: u32 = 8;

fn pack(generation: u64, percent: u8) -> u64 {
    (generation << PERCENT_BITS) | u64::from(percent)
}

const fn generation_of(state: u64) -> u64 {
    state >> PERCENT_BITS
}

const fn percent_of(state: u64) -> u8 {
    state.to_le_bytes()[0]
}

/// Upload percentage of the submission in flight
///
/// Each `reset` starts a new generation at 0. Events are recorded against the
/// generation they were issued for, so a callback kept past its submission
/// can no longer move the value. Within one generation the value only grows.
#[derive(Default)]
pub struct ProgressTracker {
    state:    AtomicU64,
    listener: Option<ProgressListener>,
}

impl ProgressTracker {
    /// Tracker reporting changes to `listener`
    #[must_use]
    pub fn new(listener: Option<ProgressListener>) -> Self {
        Self {
            state: AtomicU64::new(0),
            listener,
        }
    }

    /// Current percentage
    pub fn get(&self) -> u8 {
        percent_of(self.state.load(Ordering::SeqCst))
    }

    /// Generation events are currently accepted for
    pub fn generation(&self) -> u64 {
        generation_of(self.state.load(Ordering::SeqCst))
    }

    /// Fold in an upload event issued for `generation`
    ///
    /// Events of an older generation, events without a total and events that
    /// would lower the value are ignored.
    pub fn record(&self, generation: u64, event: UploadProgress) {
        let Some(percent) = event.percent() else {
            return;
        };
        let updated = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (generation_of(state) == generation && percent > percent_of(state))
                    .then(|| pack(generation, percent))
            });
        if updated.is_ok() {
            self.emit(percent);
        }
    }

    /// Back to 0 under a new generation, which is returned
    pub fn reset(&self) -> u64 {
        let previous = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                Some(pack(generation_of(state).wrapping_add(1), 0))
            })
            .unwrap_or_else(|state| state);
        if percent_of(previous) != 0 {
            self.emit(0);
        }
        generation_of(previous).wrapping_add(1) & (u64::MAX >> PERCENT_BITS)
    }

    fn emit(&self, percent: u8) {
        if let Some(listener) = &self.listener {
            listener(percent);
        }
    }
}
