use error_stack::Report;
use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";

/// Result type for the `record_sync` library
pub type Result<T> = std::result::Result<T, Report<Error>>;

/// Error categories surfaced by `record_sync`
///
/// Server-side validation failures are not errors here: they arrive as data in
/// `Record::errors` and `Record::base_error`.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller passed something that does not have the expected shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The base URL or a route built from it could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered but the body could not be decoded
    #[error("Response decode failed: {0}")]
    ResponseDecode(String),

    /// A submission is already outstanding for this record
    #[error("A submission is already in flight for this record")]
    SubmissionInFlight,

    /// The request could not be sent, timed out or got a non-success status
    #[error("Transport failed: {0}")]
    Transport(String),
}

impl Error {
    /// Create a "Failed to X" transport error
    pub fn failed_to(action: &str, details: impl std::fmt::Display) -> Self {
        Self::Transport(format!("{MSG_FAILED_TO_PREFIX} {action}: {details}"))
    }

    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_messages() {
        assert_eq!(
            Error::failed_to("send request", "connection refused").to_string(),
            "Transport failed: Failed to send request: connection refused"
        );
        assert_eq!(
            Error::invalid("record change", "expected a path").to_string(),
            "Invalid argument: Invalid record change: expected a path"
        );
    }

    #[test]
    fn test_report_keeps_context() {
        let report: Report<Error> = Report::new(Error::SubmissionInFlight).attach("resource: users");
        assert!(matches!(
            report.current_context(),
            Error::SubmissionInFlight
        ));
    }
}
