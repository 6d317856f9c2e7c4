//! Shared constants for path addressing, payload encoding and the HTTP transport

/// Delimiter between segments of a flattened param path
pub const PATH_DELIMITER: char = '.';

/// Form value sent for a `null` param
pub const FORM_VALUE_NULL: &str = "__FORM_VALUE_NULL__";

/// Form value sent for an empty array param
pub const FORM_VALUE_EMPTY_ARRAY: &str = "__FORM_VALUE_EMPTY_ARRAY__";

/// Form value sent for an empty object param
pub const FORM_VALUE_EMPTY_OBJECT: &str = "__FORM_VALUE_EMPTY_OBJECT__";

/// Notice sent when a submission fails for any reason
pub const SUBMISSION_FAILED_MESSAGE: &str = "There was an error updating record, check the console";

/// Default admin API root
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/admin";

/// Request timeout in seconds
pub const REQUEST_TIMEOUT: u64 = 30;

/// Size of each streamed body chunk, also the granularity of progress events
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
