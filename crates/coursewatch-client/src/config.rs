//! Configuration for the terminal client.
//!
//! All configuration is loaded from environment variables; every value has
//! a default that targets a catalog server running locally.

use std::io::IsTerminal;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Query endpoint of the catalog server.
    pub api_url: String,
    /// Semester sent with every query (empty = all).
    pub semester: String,
    /// Pause between poll cycles.
    pub poll_interval: Duration,
    /// Upper bound on a single fetch.
    pub fetch_timeout: Duration,
    /// Also print courses whose enrollment did not change.
    pub show_unchanged: bool,
    /// Text of the sticky title bar.
    pub title: String,
    /// Emit ANSI colors.
    pub color: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("http://localhost:8000/api/courses"),
            semester: String::new(),
            poll_interval: Duration::from_millis(3000),
            fetch_timeout: Duration::from_millis(10_000),
            show_unchanged: false,
            title: String::from("加退選即時通"),
            color: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `COURSEWATCH_API_URL` -- query endpoint (default `http://localhost:8000/api/courses`)
    /// - `SEMESTER` -- semester filter (default: all)
    /// - `POLL_INTERVAL_MS` -- poll period in milliseconds (default 3000)
    /// - `FETCH_TIMEOUT_MS` -- fetch timeout in milliseconds (default 10000)
    /// - `SHOW_UNCHANGED` -- print unchanged courses too (default `false`)
    /// - `COURSEWATCH_TITLE` -- title bar text
    /// - `NO_COLOR` -- disable colors when set; colors are also off when
    ///   stdout is not a terminal
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let poll_interval_ms: u64 = env_or("POLL_INTERVAL_MS", 3000)?;
        if poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "POLL_INTERVAL_MS must be positive".to_owned(),
            ));
        }
        let fetch_timeout_ms: u64 = env_or("FETCH_TIMEOUT_MS", 10_000)?;
        if fetch_timeout_ms == 0 {
            return Err(ClientError::Config(
                "FETCH_TIMEOUT_MS must be positive".to_owned(),
            ));
        }

        Ok(Self {
            api_url: std::env::var("COURSEWATCH_API_URL").unwrap_or(defaults.api_url),
            semester: std::env::var("SEMESTER").unwrap_or(defaults.semester),
            poll_interval: Duration::from_millis(poll_interval_ms),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            show_unchanged: env_or("SHOW_UNCHANGED", false)?,
            title: std::env::var("COURSEWATCH_TITLE").unwrap_or(defaults.title),
            color: std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        })
    }
}

/// Read and parse an optional environment variable.
fn env_or<T>(name: &str, default: T) -> Result<T, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid {name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000/api/courses");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(!config.show_unchanged);
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        let value: u64 = env_or("COURSEWATCH_TEST_SURELY_UNSET_VAR", 17).unwrap_or(0);
        assert_eq!(value, 17);
    }
}
