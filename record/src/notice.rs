//! User-facing notices and the notifier seam they are delivered through

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::{info, warn};

/// Severity of a notice
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeType {
    /// The action went through
    #[default]
    Success,
    /// The action failed
    Error,
    /// Informational only
    Info,
}

/// A message for the user, sent by the server or raised locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Text to show
    pub message: String,
    /// Severity
    #[serde(rename = "type", default)]
    pub kind:    NoticeType,
}

impl Notice {
    /// Create a notice
    pub fn new(message: impl Into<String>, kind: NoticeType) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Create an error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeType::Error)
    }
}

/// Receiver of notices, typically a toast or flash-message component
///
/// Delivery is fire and forget.
pub trait Notifier: Send + Sync {
    /// Show `notice` to the user
    fn notify(&self, notice: Notice);
}

impl<F> Notifier for F
where
    F: Fn(Notice) + Send + Sync,
{
    fn notify(&self, notice: Notice) {
        self(notice);
    }
}

/// Notifier that writes notices to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeType::Error => warn!("Notice ({}): {}", notice.kind, notice.message),
            NoticeType::Success | NoticeType::Info => {
                info!("Notice ({}): {}", notice.kind, notice.message);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "tests fail loudly on setup errors")]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_notice_wire_format() {
        let notice: Notice = serde_json::from_value(json!({
            "message": "Record saved",
            "type": "success"
        }))
        .expect("notice decodes");
        assert_eq!(notice, Notice::new("Record saved", NoticeType::Success));

        assert_eq!(
            serde_json::to_value(Notice::error("boom")).expect("notice encodes"),
            json!({"message": "boom", "type": "error"})
        );
    }

    #[test]
    fn test_notice_type_strings() {
        assert_eq!(NoticeType::Info.to_string(), "info");
        assert_eq!(NoticeType::Error.as_ref(), "error");
        assert_eq!(
            NoticeType::from_str("success").expect("known type"),
            NoticeType::Success
        );
        assert!(NoticeType::from_str("fatal").is_err());
    }

    #[test]
    fn test_closures_are_notifiers() {
        let seen = Mutex::new(Vec::new());
        let notifier = |notice: Notice| {
            seen.lock().expect("notices lock").push(notice);
        };

        notifier.notify(Notice::error("boom"));
        LogNotifier.notify(Notice::error("logged only"));

        assert_eq!(
            seen.into_inner().expect("notices lock"),
            vec![Notice::error("boom")]
        );
    }
}
