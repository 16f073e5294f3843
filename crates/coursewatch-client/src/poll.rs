//! The fetch, diff, render, sleep cycle.
//!
//! [`PollLoop`] suspends only while fetching and while sleeping, and
//! checks for shutdown at both points. A failed fetch skips the diff
//! entirely, so the differ's baseline always reflects the last snapshot
//! that actually arrived.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use coursewatch_types::Snapshot;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::diff::{Change, SnapshotDiffer};
use crate::error::ClientError;
use crate::fetch::SnapshotSource;
use crate::render::Renderer;

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First successful fetch: baseline established, title drawn.
    Primed {
        /// Courses in the baseline.
        courses: usize,
    },
    /// A later successful fetch was diffed and rendered.
    Rendered {
        /// Courses whose enrollment changed, appeared or disappeared.
        changes: usize,
    },
    /// The fetch failed; nothing was diffed.
    FetchFailed,
}

/// Drives a [`SnapshotSource`] on a fixed interval and renders deltas to
/// `out`.
pub struct PollLoop<S, W> {
    source: S,
    out: W,
    differ: SnapshotDiffer,
    renderer: Renderer,
    title: String,
    interval: Duration,
    failing: bool,
}

impl<S: SnapshotSource, W: Write> PollLoop<S, W> {
    /// Create a loop reading from `source` and writing frames to `out`.
    pub fn new(source: S, out: W, config: &ClientConfig) -> Self {
        Self {
            source,
            out,
            differ: SnapshotDiffer::new(),
            renderer: Renderer::from_config(config),
            title: config.title.clone(),
            interval: config.poll_interval,
            failing: false,
        }
    }

    /// The differ and its current baseline.
    pub const fn differ(&self) -> &SnapshotDiffer {
        &self.differ
    }

    /// The output sink.
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Run a single cycle without sleeping.
    ///
    /// # Errors
    ///
    /// Only terminal write failures are returned; fetch failures are
    /// reported on the status line and yield [`CycleOutcome::FetchFailed`].
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, ClientError> {
        let fetched = self.source.fetch().await;
        self.absorb(fetched)
    }

    /// Poll until `shutdown` completes.
    ///
    /// Shutdown is observed while a fetch is in flight and while sleeping
    /// between cycles. An in-flight fetch is abandoned; a frame is never
    /// cut short because frames are written synchronously.
    ///
    /// # Errors
    ///
    /// Returns the first terminal write failure.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), ClientError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(interval = ?self.interval, "Poll loop started");

        loop {
            let fetched = tokio::select! {
                biased;
                () = &mut shutdown => break,
                fetched = self.source.fetch() => fetched,
            };
            self.absorb(fetched)?;

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            snapshots = self.differ.snapshots_seen(),
            "Poll loop stopped"
        );
        Ok(())
    }

    fn absorb(&mut self, fetched: Result<Snapshot, ClientError>) -> Result<CycleOutcome, ClientError> {
        match fetched {
            Ok(snapshot) => self.render(&snapshot),
            Err(err) if err.is_transient() => {
                self.report_failure(&err)?;
                Ok(CycleOutcome::FetchFailed)
            }
            Err(err) => Err(err),
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<CycleOutcome, ClientError> {
        let recovered = std::mem::take(&mut self.failing);
        let primed = self.differ.snapshots_seen() == 0;
        let deltas = self.differ.diff(snapshot);

        if primed {
            let mut frame = self.renderer.title(&self.title);
            frame.push(self.renderer.status_at(
                snapshot.captured_at(),
                &format!("watching {} courses", snapshot.len()),
            ));
            frame.write_to(&mut self.out)?;
            info!(courses = snapshot.len(), "Baseline established");
            return Ok(CycleOutcome::Primed {
                courses: snapshot.len(),
            });
        }

        let changes = deltas
            .iter()
            .filter(|delta| delta.change != Change::Unchanged)
            .count();
        let mut frame = self.renderer.frame(&deltas, snapshot);
        if recovered {
            frame.push_front(
                self.renderer
                    .status_at(snapshot.captured_at(), "catalog reachable again"),
            );
            info!("Catalog fetch recovered");
        }
        frame.write_to(&mut self.out)?;
        debug!(changes, courses = snapshot.len(), "Cycle rendered");
        Ok(CycleOutcome::Rendered { changes })
    }

    /// Write the status line once per failure streak.
    fn report_failure(&mut self, err: &ClientError) -> Result<(), ClientError> {
        if self.failing {
            debug!(error = %err, "Catalog fetch still failing");
            return Ok(());
        }
        self.failing = true;
        warn!(error = %err, "Catalog fetch failed");

        let line = self.renderer.status(&format!("fetch failed: {err}"));
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::{Local, TimeZone, Utc};
    use coursewatch_types::{CourseId, CourseRecord};

    use super::*;

    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Snapshot, ClientError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Snapshot, ClientError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<Snapshot, ClientError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".to_owned())))
        }
    }

    fn snapshot(entries: &[(&str, u32)]) -> Snapshot {
        Snapshot::now(entries.iter().map(|(id, enrollment)| {
            let mut record = CourseRecord::new(*id, format!("Course {id}"), Some(100));
            record.set_enrollment(*enrollment);
            record
        }))
    }

    fn config() -> ClientConfig {
        ClientConfig {
            color: false,
            poll_interval: Duration::from_millis(100),
            title: String::from("Coursewatch"),
            ..ClientConfig::default()
        }
    }

    fn output_text<S: SnapshotSource>(poll: &PollLoop<S, Vec<u8>>) -> String {
        String::from_utf8(poll.output().clone()).unwrap()
    }

    #[tokio::test]
    async fn first_cycle_primes_then_renders_changes() {
        let source = ScriptedSource::new(vec![
            Ok(snapshot(&[("A", 10), ("B", 5)])),
            Ok(snapshot(&[("A", 12), ("B", 5), ("C", 1)])),
        ]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());

        assert_eq!(
            poll.poll_once().await.unwrap(),
            CycleOutcome::Primed { courses: 2 }
        );
        assert_eq!(
            poll.poll_once().await.unwrap(),
            CycleOutcome::Rendered { changes: 2 }
        );

        let text = output_text(&poll);
        assert!(text.starts_with("== Coursewatch =="));
        assert!(text.contains("watching 2 courses"));
        assert!(text.contains("+2"));
        assert!(!text.contains("Course B"));
    }

    #[tokio::test]
    async fn failed_cycle_keeps_last_successful_baseline() {
        let source = ScriptedSource::new(vec![
            Ok(snapshot(&[("A", 10)])),
            Err(ClientError::Timeout(10_000)),
            Ok(snapshot(&[("A", 11)])),
        ]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());

        poll.poll_once().await.unwrap();
        assert_eq!(poll.poll_once().await.unwrap(), CycleOutcome::FetchFailed);
        assert_eq!(poll.differ().baseline(&CourseId::from("A")), Some(10));
        assert_eq!(poll.differ().snapshots_seen(), 1);

        // Diffed against the pre-failure snapshot, not skipped or reset.
        assert_eq!(
            poll.poll_once().await.unwrap(),
            CycleOutcome::Rendered { changes: 1 }
        );
        assert!(output_text(&poll).contains("+1"));
    }

    #[tokio::test]
    async fn failure_streak_is_reported_once() {
        let source = ScriptedSource::new(vec![
            Ok(snapshot(&[("A", 1)])),
            Err(ClientError::Transport("connection refused".to_owned())),
            Err(ClientError::Status {
                status: 503,
                body: String::from("not ready"),
            }),
            Err(ClientError::Decode("expected array".to_owned())),
            Ok(snapshot(&[("A", 1)])),
        ]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());
        for _ in 0..5 {
            poll.poll_once().await.unwrap();
        }

        let text = output_text(&poll);
        assert_eq!(text.matches("fetch failed").count(), 1);
        assert!(text.contains("connection refused"));
        assert_eq!(text.matches("reachable again").count(), 1);
    }

    #[tokio::test]
    async fn fatal_errors_propagate() {
        let source = ScriptedSource::new(vec![Err(ClientError::Config("bad".to_owned()))]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());
        assert!(matches!(
            poll.poll_once().await,
            Err(ClientError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_on_interval_until_shutdown() {
        let source = ScriptedSource::new(vec![
            Ok(snapshot(&[("A", 1)])),
            Ok(snapshot(&[("A", 2)])),
            Ok(snapshot(&[("A", 3)])),
            Ok(snapshot(&[("A", 4)])),
        ]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());

        // Fetches at t=0, 100 and 200 ms; shutdown lands mid-sleep.
        poll.run(tokio::time::sleep(Duration::from_millis(250)))
            .await
            .unwrap();

        assert_eq!(poll.differ().snapshots_seen(), 3);
        assert_eq!(poll.differ().baseline(&CourseId::from("A")), Some(3));
    }

    struct StalledSource;

    impl SnapshotSource for StalledSource {
        async fn fetch(&self) -> Result<Snapshot, ClientError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_in_flight_fetch() {
        let mut poll = PollLoop::new(StalledSource, Vec::new(), &config());

        poll.run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert_eq!(poll.differ().snapshots_seen(), 0);
        assert!(poll.output().is_empty());
    }

    #[tokio::test]
    async fn primed_status_carries_capture_time() {
        let captured_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 42).unwrap();
        let first = Snapshot::new(captured_at, [CourseRecord::new("A", "Alpha", Some(10))]);
        let source = ScriptedSource::new(vec![Ok(first)]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());
        poll.poll_once().await.unwrap();

        let stamp = captured_at.with_timezone(&Local).format("%H:%M:%S");
        assert!(output_text(&poll).contains(&format!("[{stamp}] watching 1 courses")));
    }

    #[tokio::test]
    async fn run_returns_immediately_when_already_shut_down() {
        let source = ScriptedSource::new(vec![Ok(snapshot(&[("A", 1)]))]);
        let mut poll = PollLoop::new(source, Vec::new(), &config());
        poll.run(std::future::ready(())).await.unwrap();
        assert_eq!(poll.differ().snapshots_seen(), 0);
        assert!(poll.output().is_empty());
    }
}
