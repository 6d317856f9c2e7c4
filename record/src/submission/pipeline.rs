use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use error_stack::Report;
use strum::Display;
use tracing::{debug, warn};

use super::progress::{ProgressListener, ProgressTracker};
use crate::constants::SUBMISSION_FAILED_MESSAGE;
use crate::error::{Error, Result};
use crate::flat::Params;
use crate::notice::{Notice, Notifier};
use crate::payload::record_to_form_payload;
use crate::record::RecordState;
use crate::transport::{ProgressCallback, RecordActionResponse, RecordTransport, UploadProgress};

/// Where the pipeline is in its `Idle → Submitting → outcome → Idle` cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionPhase {
    /// Nothing in flight
    Idle,
    /// A request is out
    Submitting,
    /// The last request succeeded and its record was merged
    Succeeded,
    /// The last request failed; the record was left alone
    Failed,
}

/// Sends a record's snapshot to its resource and reconciles the answer
pub struct SubmissionPipeline {
    resource_id: String,
    transport:   Arc<dyn RecordTransport>,
    notifier:    Arc<dyn Notifier>,
    phase:       Mutex<SubmissionPhase>,
    progress:    Arc<ProgressTracker>,
}

/// Holds the single in-flight slot; releasing it returns the pipeline to idle
///
/// Releasing also starts a new progress generation, so upload callbacks of
/// this submission are inert afterwards.
struct InFlight<'a> {
    pipeline:   &'a SubmissionPipeline,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pipeline.progress.reset();
        self.pipeline.set_phase(SubmissionPhase::Idle);
    }
}

impl SubmissionPipeline {
    /// Pipeline for records of `resource_id`
    pub fn new(
        resource_id: impl Into<String>,
        transport: Arc<dyn RecordTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            transport,
            notifier,
            phase: Mutex::new(SubmissionPhase::Idle),
            progress: Arc::new(ProgressTracker::default()),
        }
    }

    /// Report every progress change to `listener`
    #[must_use]
    pub fn with_progress_listener(mut self, listener: ProgressListener) -> Self {
        self.progress = Arc::new(ProgressTracker::new(Some(listener)));
        self
    }

    /// Resource records are submitted to
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    fn lock_phase(&self) -> MutexGuard<'_, SubmissionPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        let mut current = self.lock_phase();
        debug!(
            "Submission for '{}': {} -> {}",
            self.resource_id, *current, phase
        );
        *current = phase;
    }

    /// Current phase
    pub fn phase(&self) -> SubmissionPhase {
        *self.lock_phase()
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.phase() == SubmissionPhase::Submitting
    }

    /// Upload percentage of the request in flight, 0 when idle
    pub fn progress(&self) -> u8 {
        self.progress.get()
    }

    /// Claim the in-flight slot
    fn begin(&self) -> Result<InFlight<'_>> {
        let mut phase = self.lock_phase();
        if *phase == SubmissionPhase::Submitting {
            warn!(
                "Rejecting submission for '{}': another one is in flight",
                self.resource_id
            );
            return Err(Report::new(Error::SubmissionInFlight)
                .attach(format!("Resource: {}", self.resource_id)));
        }
        *phase = SubmissionPhase::Submitting;
        drop(phase);

        let generation = self.progress.reset();
        Ok(InFlight {
            pipeline: self,
            generation,
        })
    }

    /// Submit the current snapshot of `state`
    ///
    /// Persisted records are sent as an edit, others as a create.
    /// `custom_fields` overwrite payload fields of the same name. On success
    /// the server notice, if any, goes to the notifier and the response
    /// record is merged into `state`. On failure a generic error notice is
    /// sent and `state` is left alone. Either way the pipeline ends idle
    /// with progress 0, and the transport result is handed back.
    ///
    /// # Errors
    /// Returns `SubmissionInFlight` without side effects when a submission is
    /// already out, otherwise whatever the transport failed with.
    pub async fn submit(
        &self,
        state: &RecordState,
        custom_fields: Option<&Params>,
    ) -> Result<RecordActionResponse> {
        let in_flight = self.begin()?;

        let record = state.current();
        let mut payload = record_to_form_payload(&record);
        if let Some(fields) = custom_fields {
            payload.overlay(fields);
        }

        let tracker = Arc::clone(&self.progress);
        let generation = in_flight.generation;
        let progress: ProgressCallback =
            Arc::new(move |event: UploadProgress| tracker.record(generation, event));

        let result = match record.id.as_deref() {
            Some(record_id) => {
                debug!(
                    "Submitting edit of '{}' record {record_id} ({} fields)",
                    self.resource_id,
                    payload.len()
                );
                self.transport
                    .edit_record(&self.resource_id, record_id, payload, progress)
                    .await
            }
            None => {
                debug!(
                    "Submitting new '{}' record ({} fields)",
                    self.resource_id,
                    payload.len()
                );
                self.transport
                    .create_record(&self.resource_id, payload, progress)
                    .await
            }
        };

        match &result {
            Ok(response) => {
                if let Some(notice) = &response.notice {
                    self.notifier.notify(notice.clone());
                }
                state.merge_response(response.record.clone());
                self.set_phase(SubmissionPhase::Succeeded);
            }
            Err(report) => {
                warn!(
                    "Submission for '{}' failed: {report:?}",
                    self.resource_id
                );
                self.notifier.notify(Notice::error(SUBMISSION_FAILED_MESSAGE));
                self.set_phase(SubmissionPhase::Failed);
            }
        }

        drop(in_flight);
        result
    }
}
