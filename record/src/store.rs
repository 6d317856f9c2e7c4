//! The record store a UI layer binds to
//!
//! Combines the record snapshot with its submission pipeline and exposes the
//! handful of operations form components need.

use std::sync::Arc;

use crate::error::Result;
use crate::flat::Params;
use crate::notice::Notifier;
use crate::record::{Record, RecordChange, RecordOptions, RecordState};
use crate::submission::{ProgressListener, SubmissionPhase, SubmissionPipeline};
use crate::transport::{RecordActionResponse, RecordTransport};

/// State and submission handling for one record of one resource
pub struct RecordStore {
    state:    RecordState,
    pipeline: SubmissionPipeline,
}

impl RecordStore {
    /// Store for `initial` (or a new, empty record) of `resource_id`
    pub fn new(
        resource_id: impl Into<String>,
        initial: Option<Record>,
        transport: Arc<dyn RecordTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state:    RecordState::new(initial, RecordOptions::default()),
            pipeline: SubmissionPipeline::new(resource_id, transport, notifier),
        }
    }

    /// Apply `options` to the current and all future snapshots
    ///
    /// Whether local edits are saved is unaffected.
    #[must_use]
    pub fn with_options(self, options: RecordOptions) -> Self {
        Self {
            state:    self.state.with_options(options),
            pipeline: self.pipeline,
        }
    }

    /// Report every upload progress change to `listener`
    #[must_use]
    pub fn with_progress_listener(self, listener: ProgressListener) -> Self {
        Self {
            state:    self.state,
            pipeline: self.pipeline.with_progress_listener(listener),
        }
    }

    /// Resource the record belongs to
    pub fn resource_id(&self) -> &str {
        self.pipeline.resource_id()
    }

    /// The current snapshot
    pub fn current_record(&self) -> Arc<Record> {
        self.state.current()
    }

    /// Apply a field edit or whole-record change
    pub fn apply_change(&self, change: RecordChange) -> Arc<Record> {
        self.state.apply(change)
    }

    /// Switch to another record, as when navigating to a different entity
    pub fn set_record(&self, record: Record) -> Arc<Record> {
        self.state.replace(record)
    }

    /// Submit the current snapshot
    ///
    /// See [`SubmissionPipeline::submit`]. Transport failures have already
    /// been reported and recovered from when the error comes back.
    ///
    /// # Errors
    /// `SubmissionInFlight` when a submission is already out, otherwise the
    /// transport error.
    pub async fn submit(&self, custom_fields: Option<Params>) -> Result<RecordActionResponse> {
        self.pipeline
            .submit(&self.state, custom_fields.as_ref())
            .await
    }

    /// Whether a submission is in flight
    pub fn is_loading(&self) -> bool {
        self.pipeline.is_loading()
    }

    /// Upload percentage of the submission in flight
    pub fn progress(&self) -> u8 {
        self.pipeline.progress()
    }

    /// Where the submission cycle currently is
    pub fn phase(&self) -> SubmissionPhase {
        self.pipeline.phase()
    }

    /// False while local edits have not been saved
    pub fn is_synced(&self) -> bool {
        self.state.is_synced()
    }
}
