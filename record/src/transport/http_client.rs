//! HTTP transport for the admin REST API
//!
//! Record actions are posted as `multipart/form-data`. Every field is streamed
//! in chunks so upload progress can be reported while the body goes out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use error_stack::Report;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Url};
use tracing::{debug, warn};

use super::types::{ProgressCallback, RecordAction, RecordActionResponse, UploadProgress};
use super::RecordTransport;
use crate::constants::{DEFAULT_BASE_URL, REQUEST_TIMEOUT, UPLOAD_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::payload::FormPayload;

/// Where and how the HTTP transport connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Admin root, for example `http://localhost:3000/admin`
    pub base_url: String,
    /// Per-request timeout
    pub timeout:  Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout:  Duration::from_secs(REQUEST_TIMEOUT),
        }
    }
}

impl HttpTransportConfig {
    /// Use another admin root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use another per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `RecordTransport` over HTTP
pub struct HttpTransport {
    config:   HttpTransportConfig,
    base_url: Url,
    client:   reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the configured admin root
    ///
    /// # Errors
    /// Returns `InvalidUrl` when `base_url` does not parse or cannot carry a path.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Report::new(Error::InvalidUrl(format!("{}: {e}", config.base_url)))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Report::new(Error::InvalidUrl(format!(
                "{} cannot carry a path",
                config.base_url
            ))));
        }

        Ok(Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    /// The configuration in use
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Build `{base}/api/resources/{segments...}`
    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Report::new(Error::InvalidUrl(format!(
                    "{} cannot carry a path",
                    self.config.base_url
                )))
            })?
            .pop_if_empty()
            .extend(["api", "resources"])
            .extend(segments);
        Ok(url)
    }

    /// Route of a resource level action such as `new`
    fn resource_action_url(&self, resource_id: &str, action: RecordAction) -> Result<Url> {
        self.build_url(&[resource_id, "actions", action.as_ref()])
    }

    /// Route of a record level action such as `edit`
    fn record_action_url(
        &self,
        resource_id: &str,
        record_id: &str,
        action: RecordAction,
    ) -> Result<Url> {
        self.build_url(&[resource_id, "records", record_id, action.as_ref()])
    }

    /// Build the multipart body, reporting cumulative bytes as chunks are read
    fn build_form(payload: &FormPayload, progress: &ProgressCallback) -> Form {
        let total = payload.content_length();
        let sent = Arc::new(AtomicU64::new(0));

        payload.fields().iter().fold(Form::new(), |form, field| {
            let chunks: Vec<Vec<u8>> = field
                .value
                .as_bytes()
                .chunks(UPLOAD_CHUNK_SIZE)
                .map(<[u8]>::to_vec)
                .collect();
            let sent = Arc::clone(&sent);
            let progress = Arc::clone(progress);
            let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>))
                .inspect_ok(move |chunk| {
                    let len = chunk.len() as u64;
                    let loaded = sent.fetch_add(len, Ordering::Relaxed) + len;
                    progress(UploadProgress { loaded, total });
                });

            let part = Part::stream_with_length(Body::wrap_stream(stream), field.value.len() as u64);
            form.part(field.name.clone(), part)
        })
    }

    /// Post the payload and decode the action response
    async fn send_request(
        &self,
        action: RecordAction,
        url: Url,
        payload: &FormPayload,
        progress: &ProgressCallback,
    ) -> Result<RecordActionResponse> {
        debug!(
            "Record {action} action: POST {url} with {} fields ({} bytes)",
            payload.len(),
            payload.content_length()
        );

        let response = self
            .client
            .post(url.clone())
            .multipart(Self::build_form(payload, progress))
            .timeout(self.config.timeout)
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => return Err(Self::handle_error(action, &url, &e)),
        };

        // Check HTTP status before decoding
        Self::check_status(action, &url, &response)?;

        match response.json::<RecordActionResponse>().await {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!("Record {action} action: JSON decoding failed - error={e}");
                Err(Report::new(Error::ResponseDecode(e.to_string()))
                    .attach(format!("Action: {action}, URL: {url}")))
            }
        }
    }

    /// Check if the HTTP response status is successful
    fn check_status(action: RecordAction, url: &Url, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        warn!("Record {action} action: HTTP status error - status={status}");
        Err(Report::new(Error::failed_to(
            "complete record action",
            format!(
                "server returned HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
        ))
        .attach(format!("Action: {action}, URL: {url}")))
    }

    /// Turn a send failure into a report with the context needed to debug it
    fn handle_error(action: RecordAction, url: &Url, e: &reqwest::Error) -> Report<Error> {
        warn!("Record {action} action: HTTP request failed - error={e}");

        let error_type = if e.is_timeout() {
            "Timeout"
        } else if e.is_connect() {
            "Connection failed"
        } else if e.is_request() {
            "Request error"
        } else if e.is_body() {
            "Body error"
        } else {
            "Unknown error type"
        };

        Report::new(Error::failed_to(
            &format!("send record {action} action"),
            format!("{error_type}: {e}"),
        ))
        .attach(format!("Action: {action}, URL: {url}"))
        .attach(format!("Full error: {e:?}"))
    }
}

#[async_trait::async_trait]
impl RecordTransport for HttpTransport {
    async fn create_record(
        &self,
        resource_id: &str,
        payload: FormPayload,
        progress: ProgressCallback,
    ) -> Result<RecordActionResponse> {
        let url = self.resource_action_url(resource_id, RecordAction::New)?;
        self.send_request(RecordAction::New, url, &payload, &progress)
            .await
    }

    async fn edit_record(
        &self,
        resource_id: &str,
        record_id: &str,
        payload: FormPayload,
        progress: ProgressCallback,
    ) -> Result<RecordActionResponse> {
        let url = self.record_action_url(resource_id, record_id, RecordAction::Edit)?;
        self.send_request(RecordAction::Edit, url, &payload, &progress)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "tests fail loudly on setup errors")]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig::default().with_base_url(base_url))
            .expect("valid base url")
    }

    fn ignore_progress() -> ProgressCallback {
        Arc::new(|_: UploadProgress| {})
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn content_length(head: &str) -> Option<usize> {
        head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
    }

    /// Accept one request, answer it, and hand back the request head
    async fn serve_once(listener: TcpListener, status_line: &str, body: &str) -> String {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut chunk = [0_u8; 8192];

        let head = loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break String::from_utf8_lossy(&request).to_string();
            }
            request.extend_from_slice(&chunk[..read]);

            let Some(head_end) = find(&request, b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&request[..head_end]).to_string();
            let complete = content_length(&head).map_or_else(
                || request.ends_with(b"0\r\n\r\n"),
                |length| request.len() >= head_end + 4 + length,
            );
            if complete {
                break head;
            }
        };

        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.expect("shutdown");
        head
    }

    #[test]
    fn test_routes() {
        let transport = transport("http://localhost:3000/admin");

        let create = transport
            .resource_action_url("users", RecordAction::New)
            .expect("create url");
        assert_eq!(
            create.as_str(),
            "http://localhost:3000/admin/api/resources/users/actions/new"
        );

        let edit = transport
            .record_action_url("blog posts", "7", RecordAction::Edit)
            .expect("edit url");
        assert_eq!(
            edit.as_str(),
            "http://localhost:3000/admin/api/resources/blog%20posts/records/7/edit"
        );
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let transport = transport("http://localhost:3000/admin/");
        let url = transport
            .resource_action_url("users", RecordAction::New)
            .expect("url");
        assert_eq!(url.path(), "/admin/api/resources/users/actions/new");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpTransport::new(HttpTransportConfig::default().with_base_url("not a url"));
        assert!(matches!(
            result.as_ref().map_err(Report::current_context),
            Err(Error::InvalidUrl(_))
        ));

        let result = HttpTransport::new(HttpTransportConfig::default().with_base_url("mailto:a@b"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_posts_multipart_and_reports_progress() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(serve_once(
            listener,
            "200 OK",
            r#"{"record":{"id":"7","params":{"name":"Alice"}},"notice":{"message":"Created","type":"success"}}"#,
        ));

        let mut payload = FormPayload::default();
        payload.set("name", "Alice");
        payload.set("bio", "x".repeat(UPLOAD_CHUNK_SIZE * 2 + 10));
        let total = payload.content_length();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let progress: ProgressCallback = Arc::new(move |event: UploadProgress| {
            if let Ok(mut events) = sink.lock() {
                events.push(event);
            }
        });

        let response = transport(&format!("http://{addr}/admin"))
            .create_record("users", payload, progress)
            .await
            .expect("create succeeds");

        assert_eq!(response.record.id.as_deref(), Some("7"));
        assert_eq!(response.notice.map(|n| n.message), Some("Created".to_string()));

        let head = server.await.expect("server task");
        assert!(
            head.starts_with("POST /admin/api/resources/users/actions/new HTTP/1.1"),
            "unexpected request head: {head}"
        );
        assert!(head.to_ascii_lowercase().contains("multipart/form-data"));

        let events = events.lock().expect("events").clone();
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|pair| pair[0].loaded <= pair[1].loaded));
        assert_eq!(events.last().map(|e| e.loaded), Some(total));
        assert!(events.iter().all(|e| e.total == total));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(serve_once(
            listener,
            "500 Internal Server Error",
            r#"{"message":"boom"}"#,
        ));

        let result = transport(&format!("http://{addr}/admin"))
            .edit_record("users", "7", FormPayload::default(), ignore_progress())
            .await;

        let head = server.await.expect("server task");
        assert!(head.starts_with("POST /admin/api/resources/users/records/7/edit HTTP/1.1"));

        let report = result.expect_err("500 must fail");
        assert!(matches!(report.current_context(), Error::Transport(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(serve_once(listener, "200 OK", "not json"));

        let result = transport(&format!("http://{addr}/admin"))
            .create_record("users", FormPayload::default(), ignore_progress())
            .await;
        server.await.expect("server task");

        let report = result.expect_err("bad body must fail");
        assert!(matches!(report.current_context(), Error::ResponseDecode(_)));
    }

    #[tokio::test]
    async fn test_closed_port_is_transport_failure() {
        // grab a free port, then close it again
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = transport(&format!("http://{addr}/admin"))
            .create_record("users", FormPayload::default(), ignore_progress())
            .await;

        let report = result.expect_err("nothing listens there");
        assert!(matches!(report.current_context(), Error::Transport(_)));
    }
}
