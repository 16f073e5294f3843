//! Error types for the catalog server binary.
//!
//! [`ServerBinError`] is the top-level error type that wraps every
//! failure mode during startup and serving.

/// Top-level error for the catalog server binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: coursewatch_core::config::ConfigError,
    },

    /// Seeding the catalog failed.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying lifecycle error.
        #[from]
        source: coursewatch_core::lifecycle::LifecycleError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: coursewatch_api::ServerError,
    },
}
