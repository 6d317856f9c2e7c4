//! The seam between the submission pipeline and the network
//!
//! Submissions go through an injected [`RecordTransport`] rather than a global
//! client. [`HttpTransport`] talks to the admin REST API; tests script their own.

mod http_client;
mod types;

use async_trait::async_trait;

pub use self::http_client::{HttpTransport, HttpTransportConfig};
pub use self::types::{ProgressCallback, RecordAction, RecordActionResponse, UploadProgress};
use crate::error::Result;
use crate::payload::FormPayload;

/// Sends create and edit actions for records of a resource
#[async_trait]
pub trait RecordTransport: Send + Sync {
    /// Create a record of `resource_id`
    async fn create_record(
        &self,
        resource_id: &str,
        payload: FormPayload,
        progress: ProgressCallback,
    ) -> Result<RecordActionResponse>;

    /// Update record `record_id` of `resource_id`
    async fn edit_record(
        &self,
        resource_id: &str,
        record_id: &str,
        payload: FormPayload,
        progress: ProgressCallback,
    ) -> Result<RecordActionResponse>;
}
