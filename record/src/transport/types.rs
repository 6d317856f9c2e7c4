//! Wire types exchanged with the admin API

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::notice::Notice;
use crate::record::Record;

/// Which record action a submission runs, named as in API routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RecordAction {
    /// Create a record
    New,
    /// Update a persisted record
    Edit,
}

/// Body of a successful record action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordActionResponse {
    /// The record as the server now sees it
    pub record:       Record,
    /// Message to show the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice:       Option<Notice>,
    /// Where the server suggests navigating next
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl RecordActionResponse {
    /// Response carrying only a record
    #[must_use]
    pub const fn new(record: Record) -> Self {
        Self {
            record,
            notice: None,
            redirect_url: None,
        }
    }

    /// Attach a notice
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Bytes of the request body handed to the network so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes sent
    pub loaded: u64,
    /// Bytes in the whole body
    pub total:  u64,
}

impl UploadProgress {
    /// Rounded percentage in `0..=100`, or `None` when the total is unknown
    #[must_use]
    pub fn percent(self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let loaded = u128::from(self.loaded.min(self.total));
        let total = u128::from(self.total);
        let rounded = (loaded * 100 + total / 2) / total;
        u8::try_from(rounded).ok()
    }
}

/// Callback a transport reports upload progress through
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[cfg(test)]
#[allow(clippy::expect_used, reason = "tests fail loudly on setup errors")]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notice::NoticeType;

    #[test]
    fn test_percent_rounding() {
        let percent = |loaded, total| UploadProgress { loaded, total }.percent();

        assert_eq!(percent(25, 100), Some(25));
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(1, 200), Some(1));
        assert_eq!(percent(500, 100), Some(100));
        assert_eq!(percent(10, 0), None);
        assert_eq!(percent(u64::MAX, u64::MAX), Some(100));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(RecordAction::New.as_ref(), "new");
        assert_eq!(RecordAction::Edit.as_ref(), "edit");
        assert_eq!(RecordAction::Edit.to_string(), "edit");
    }

    #[test]
    fn test_response_decoding() {
        let response: RecordActionResponse = serde_json::from_value(json!({
            "record": {"id": "7", "params": {"name": "Alice"}},
            "notice": {"message": "Successfully created a new record", "type": "success"},
            "redirectUrl": "/admin/resources/users/records/7/show"
        }))
        .expect("response decodes");

        assert_eq!(response.record.id.as_deref(), Some("7"));
        assert_eq!(
            response.notice.map(|n| n.kind),
            Some(NoticeType::Success)
        );
        assert_eq!(
            response.redirect_url.as_deref(),
            Some("/admin/resources/users/records/7/show")
        );
    }
}
