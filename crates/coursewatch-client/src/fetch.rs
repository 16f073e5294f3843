//! Snapshot sources for the poll loop.
//!
//! [`SnapshotSource`] abstracts "give me the current catalog" so the poll
//! loop can be driven by the real HTTP endpoint ([`HttpSource`]) or by a
//! scripted source in tests.

use std::future::Future;
use std::time::Duration;

use coursewatch_types::{CourseQuery, CourseRecord, Snapshot};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Longest error-body excerpt kept for the status line, in characters.
const MAX_ERROR_BODY_CHARS: usize = 120;

/// Something that can produce a fresh catalog snapshot.
pub trait SnapshotSource {
    /// Fetch the current catalog.
    ///
    /// # Errors
    ///
    /// Returns a transient [`ClientError`] when the catalog cannot be
    /// reached or answers with something other than a record list.
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, ClientError>>;
}

/// Polls the catalog's query endpoint over HTTP.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    query: CourseQuery,
    timeout: Duration,
}

impl HttpSource {
    /// Build a source from client configuration.
    ///
    /// The whole request, including reading the body, is bounded by
    /// `config.fetch_timeout`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
            query: CourseQuery::for_semester(config.semester.clone()),
            timeout: config.fetch_timeout,
        })
    }

    fn classify(&self, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_millis())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot, ClientError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&self.query)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(&e))?;
        let records = decode_records(&bytes)?;
        debug!(courses = records.len(), "Catalog snapshot fetched");
        Ok(Snapshot::now(records))
    }
}

/// First line of an error body, cut to [`MAX_ERROR_BODY_CHARS`].
fn truncate_body(body: &str) -> String {
    let line = body.trim().lines().next().unwrap_or_default();
    let mut chars = line.chars();
    let mut excerpt: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
    if chars.next().is_some() || body.trim().lines().nth(1).is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

/// Decode a JSON array of course records.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<CourseRecord>, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
