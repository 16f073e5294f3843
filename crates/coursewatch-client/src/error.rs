//! Error types for the terminal client.
//!
//! Fetch-side variants ([`ClientError::Transport`], [`ClientError::Timeout`],
//! [`ClientError::Status`], [`ClientError::Decode`]) are transient: the
//! poll loop reports them and retries on the next cycle. Only
//! [`ClientError::Config`] and [`ClientError::Io`] end the process.

/// Errors that can occur during client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The catalog could not be reached.
    #[error("request failed: {0}")]
    Transport(String),

    /// The catalog did not answer within the fetch timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u128),

    /// The catalog answered with an error status.
    #[error("catalog returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body was not a list of course records.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Writing to the terminal failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the poll loop should retry after this error.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Status { .. } | Self::Decode(_)
        )
    }
}
