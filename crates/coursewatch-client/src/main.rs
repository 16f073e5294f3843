//! Terminal client entry point.
//!
//! Loads configuration from the environment, then polls the catalog and
//! renders enrollment changes until `Ctrl-C`. Logs go to stderr so they
//! never interleave with frames on stdout.

use std::io::{self, Write};

use coursewatch_client::render::RESET_SCROLL_REGION;
use coursewatch_client::{ClientConfig, HttpSource, PollLoop};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Restores the terminal scroll region when the client exits.
struct TerminalGuard {
    active: bool,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(RESET_SCROLL_REGION.as_bytes());
            let _ = stdout.write_all(b"\n");
            let _ = stdout.flush();
        }
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the terminal cannot be
/// written.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!(
        api_url = config.api_url,
        semester = config.semester,
        poll_interval_ms = config.poll_interval.as_millis(),
        fetch_timeout_ms = config.fetch_timeout.as_millis(),
        "configuration loaded"
    );

    let source = HttpSource::new(&config)?;
    let _guard = TerminalGuard {
        active: config.color,
    };
    let mut poll = PollLoop::new(source, io::stdout(), &config);
    poll.run(shutdown_signal()).await?;

    info!("coursewatch client stopped");
    Ok(())
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}
