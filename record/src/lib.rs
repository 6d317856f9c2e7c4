//! # record_sync
//!
//! Client-side state for a single record that is created or edited through a
//! remote admin API while form components render and change it.
//!
//! - [`flat`] converts between dotted-path params and nested values
//! - [`record`] holds the [`Record`] model, its pure transitions and
//!   [`RecordState`]
//! - [`submission`] sends a snapshot, tracks upload progress and merges the
//!   server answer back
//! - [`transport`] is the network seam, with an HTTP implementation
//! - [`RecordStore`] ties it together for a UI layer
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use record_sync::{
//!     HttpTransport, HttpTransportConfig, LogNotifier, RecordChange, RecordStore,
//! };
//!
//! # async fn run() -> record_sync::Result<()> {
//! let transport = HttpTransport::new(HttpTransportConfig::default())?;
//! let store = RecordStore::new("users", None, Arc::new(transport), Arc::new(LogNotifier));
//!
//! store.apply_change(RecordChange::edit("name", "Alice"));
//! store.apply_change(RecordChange::edit("address.city", "Oslo"));
//! store.submit(None).await?;
//! # Ok(())
//! # }
//! ```

mod constants;
mod error;
pub mod flat;
mod notice;
mod payload;
pub mod record;
mod store;
pub mod submission;
pub mod transport;

pub use constants::{
    FORM_VALUE_EMPTY_ARRAY, FORM_VALUE_EMPTY_OBJECT, FORM_VALUE_NULL, SUBMISSION_FAILED_MESSAGE,
};
pub use error::{Error, Result};
pub use notice::{LogNotifier, Notice, NoticeType, Notifier};
pub use payload::{FormField, FormPayload, record_to_form_payload};
pub use record::{PropertyError, Record, RecordChange, RecordOptions, RecordState};
pub use store::RecordStore;
pub use transport::{
    HttpTransport, HttpTransportConfig, ProgressCallback, RecordActionResponse, RecordTransport,
    UploadProgress,
};
