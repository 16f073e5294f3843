//! Background enrollment simulation.
//!
//! [`SimulationDriver`] perturbs enrollment counts on a fixed period so the
//! catalog behaves like a live add/drop window. Each tick visits a batch of
//! courses chosen by a rotating cursor over the ordered identifier list;
//! with the default divisor of 60 and a one-second period every course is
//! revisited about once a minute.
//!
//! For a course with a declared ceiling the outcome is weighted:
//!
//! | Roll | Outcome |
//! |------|---------|
//! | `< fill_percent` | fill to the ceiling |
//! | `< fill_percent + drop_one_percent` | drop one student |
//! | otherwise | drop two students |
//!
//! Courses without a ceiling follow [`UnboundedPolicy`]. All writes go
//! through [`CourseStore::mutate`], which clamps the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use coursewatch_types::{CourseId, CourseRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{SimulationConfig, UnboundedPolicy};
use crate::store::CourseStore;

/// Lock-free driver counters, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct DriverStats {
    ticks: AtomicU64,
    cursor: AtomicUsize,
    mutations: AtomicU64,
}

impl DriverStats {
    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Position of the rotating cursor after the last tick.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Number of mutations that changed an enrollment value.
    pub fn mutations(&self) -> u64 {
        self.mutations.load(Ordering::Acquire)
    }
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1-based).
    pub tick: u64,
    /// Courses selected this tick.
    pub selected: usize,
    /// Courses whose enrollment changed.
    pub changed: usize,
    /// Courses left alone by policy or missing from the store.
    pub skipped: usize,
}

/// Periodic enrollment mutator.
#[derive(Debug)]
pub struct SimulationDriver {
    store: CourseStore,
    config: SimulationConfig,
    rng: StdRng,
    cursor: usize,
    tick: u64,
    stats: Arc<DriverStats>,
}

impl SimulationDriver {
    /// Create a driver over `store`.
    ///
    /// Uses `config.rng_seed` when set, otherwise OS entropy.
    pub fn new(store: CourseStore, config: SimulationConfig) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            store,
            config,
            rng,
            cursor: 0,
            tick: 0,
            stats: Arc::new(DriverStats::default()),
        }
    }

    /// Shared counters for this driver.
    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }

    /// Number of courses visited per tick for a catalog of `total` courses.
    pub fn batch_size(&self, total: usize) -> usize {
        let by_divisor = total.div_ceil(self.config.batch_divisor.max(1));
        self.config
            .max_batch
            .map_or(by_divisor, |cap| by_divisor.min(cap))
            .min(total)
    }

    /// Pick this tick's batch and advance the cursor, wrapping at the end.
    pub fn select_batch(&mut self, ids: &[CourseId]) -> Vec<CourseId> {
        let size = self.batch_size(ids.len());
        if size == 0 {
            return Vec::new();
        }

        let start = self.cursor.checked_rem(ids.len()).unwrap_or(0);
        let batch: Vec<CourseId> = ids.iter().cycle().skip(start).take(size).cloned().collect();
        self.cursor = start.saturating_add(size).checked_rem(ids.len()).unwrap_or(0);
        batch
    }

    /// Run one tick against the store.
    pub async fn tick(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let ids = self.store.ids().await;
        let batch = self.select_batch(&ids);

        let mut report = TickReport {
            tick: self.tick,
            selected: batch.len(),
            ..TickReport::default()
        };

        for id in &batch {
            let mut skipped = false;
            let rng = &mut self.rng;
            let config = &self.config;
            let change = self
                .store
                .mutate(id, |record| {
                    next_target(rng, config, record).unwrap_or_else(|| {
                        skipped = true;
                        i64::from(record.enrollment)
                    })
                })
                .await;

            match change {
                Some(change) if change.changed() => {
                    report.changed = report.changed.saturating_add(1);
                    debug!(
                        course = %change.course_id,
                        before = change.before,
                        after = change.after,
                        "Enrollment changed"
                    );
                }
                Some(_) if skipped => report.skipped = report.skipped.saturating_add(1),
                Some(_) => {}
                None => {
                    warn!(course = %id, "Simulated course vanished from the store, skipping");
                    report.skipped = report.skipped.saturating_add(1);
                }
            }
        }

        self.stats.ticks.store(self.tick, Ordering::Release);
        self.stats.cursor.store(self.cursor, Ordering::Release);
        self.stats
            .mutations
            .fetch_add(u64::try_from(report.changed).unwrap_or(u64::MAX), Ordering::AcqRel);

        report
    }

    /// Spawn the driver on a background Tokio task.
    ///
    /// The first tick fires one period after spawning. The returned
    /// [`DriverHandle`] stops the loop between ticks, so no tick is ever
    /// interrupted halfway through its batch.
    pub fn spawn(self) -> DriverHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = self.stats();
        let join = tokio::spawn(self.run(stop_rx));
        DriverHandle {
            stop: stop_tx,
            join,
            stats,
        }
    }

    async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let period = Duration::from_millis(self.config.tick_interval_ms.max(1));
        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            batch_divisor = self.config.batch_divisor,
            max_batch = ?self.config.max_batch,
            unbounded = ?self.config.unbounded,
            "Simulation driver started"
        );

        let now = Instant::now();
        let mut interval = tokio::time::interval_at(now.checked_add(period).unwrap_or(now), period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.tick().await;
                    debug!(
                        tick = report.tick,
                        selected = report.selected,
                        changed = report.changed,
                        skipped = report.skipped,
                        "Simulation tick complete"
                    );
                }
                _ = stop.changed() => break,
            }
        }

        info!(ticks = self.tick, "Simulation driver stopped");
    }
}

/// Handle to a running [`SimulationDriver`].
#[derive(Debug)]
pub struct DriverHandle {
    stop: watch::Sender<bool>,
    join: JoinHandle<()>,
    stats: Arc<DriverStats>,
}

impl DriverHandle {
    /// Shared counters of the running driver.
    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }

    /// Signal the driver to stop and wait for its task to finish.
    pub async fn shutdown(self) {
        // Err means the task already exited and dropped its receiver.
        let _ = self.stop.send(true);
        if let Err(e) = self.join.await {
            warn!(error = %e, "Simulation driver task ended abnormally");
        }
    }
}

/// Desired enrollment for `record`, or `None` to leave it untouched.
fn next_target(rng: &mut impl Rng, config: &SimulationConfig, record: &CourseRecord) -> Option<i64> {
    let current = i64::from(record.enrollment);
    if let Some(ceiling) = record.enrollment_ceiling() {
        let roll: u16 = rng.random_range(0..100);
        let fill = u16::from(config.fill_percent);
        let drop_one = fill.saturating_add(u16::from(config.drop_one_percent));
        let target = if roll < fill {
            i64::from(ceiling)
        } else if roll < drop_one {
            current.saturating_sub(1)
        } else {
            current.saturating_sub(2)
        };
        return Some(target);
    }

    match config.unbounded {
        UnboundedPolicy::Skip => None,
        UnboundedPolicy::Walk { max_step } => {
            let max_step = i64::from(max_step);
            Some(current.saturating_add(rng.random_range(-max_step..=max_step)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn course(id: &str, capacity: Option<u32>, enrollment: u32) -> CourseRecord {
        let mut record = CourseRecord::new(id, format!("Course {id}"), capacity);
        record.set_enrollment(enrollment);
        record
    }

    async fn store_with(records: Vec<CourseRecord>) -> CourseStore {
        let store = CourseStore::new();
        store.seed(records).await.unwrap();
        store
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            rng_seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    fn ids(codes: &[&str]) -> Vec<CourseId> {
        codes.iter().map(|c| CourseId::from(*c)).collect()
    }

    #[test]
    fn batch_size_rounds_up_and_respects_cap() {
        let driver = SimulationDriver::new(CourseStore::new(), config());
        assert_eq!(driver.batch_size(0), 0);
        assert_eq!(driver.batch_size(1), 1);
        assert_eq!(driver.batch_size(60), 1);
        assert_eq!(driver.batch_size(61), 2);

        let capped = SimulationDriver::new(
            CourseStore::new(),
            SimulationConfig {
                batch_divisor: 1,
                max_batch: Some(3),
                ..config()
            },
        );
        assert_eq!(capped.batch_size(10), 3);
    }

    #[test]
    fn cursor_rotates_and_wraps() {
        let mut driver = SimulationDriver::new(
            CourseStore::new(),
            SimulationConfig {
                batch_divisor: 2,
                ..config()
            },
        );
        let all = ids(&["A", "B", "C", "D", "E"]);

        assert_eq!(driver.select_batch(&all), ids(&["A", "B", "C"]));
        assert_eq!(driver.select_batch(&all), ids(&["D", "E", "A"]));
        assert_eq!(driver.cursor, 1);
        assert_eq!(driver.select_batch(&all), ids(&["B", "C", "D"]));
    }

    #[test]
    fn fill_roll_targets_ceiling() {
        let mut rng = StdRng::seed_from_u64(0);
        let always_fill = SimulationConfig {
            fill_percent: 100,
            drop_one_percent: 0,
            ..config()
        };
        let mut record = course("A", Some(30), 4);
        record.three_student = 5;
        assert_eq!(next_target(&mut rng, &always_fill, &record), Some(25));
    }

    #[test]
    fn drop_rolls_decrement() {
        let mut rng = StdRng::seed_from_u64(0);
        let record = course("A", Some(30), 10);

        let drop_one = SimulationConfig {
            fill_percent: 0,
            drop_one_percent: 100,
            ..config()
        };
        assert_eq!(next_target(&mut rng, &drop_one, &record), Some(9));

        let drop_two = SimulationConfig {
            fill_percent: 0,
            drop_one_percent: 0,
            ..config()
        };
        assert_eq!(next_target(&mut rng, &drop_two, &record), Some(8));
    }

    #[test]
    fn unbounded_policy_is_explicit() {
        let mut rng = StdRng::seed_from_u64(0);
        let record = course("A", None, 3);
        assert_eq!(next_target(&mut rng, &config(), &record), None);

        let walk = SimulationConfig {
            unbounded: UnboundedPolicy::Walk { max_step: 2 },
            ..config()
        };
        for _ in 0..100 {
            let target = next_target(&mut rng, &walk, &record).unwrap();
            assert!((1..=5).contains(&target));
        }
    }

    #[tokio::test]
    async fn disabled_driver_leaves_seed_state_identical() {
        let store = store_with(vec![
            course("A", Some(10), 3),
            course("B", Some(40), 40),
            course("C", None, 7),
        ])
        .await;
        let before = serde_json::to_vec(&store.get_all().await.into_records()).unwrap();

        let mut driver = SimulationDriver::new(
            store.clone(),
            SimulationConfig {
                max_batch: Some(0),
                ..config()
            },
        );
        for _ in 0..25 {
            let report = driver.tick().await;
            assert_eq!(report.selected, 0);
        }

        let after = serde_json::to_vec(&store.get_all().await.into_records()).unwrap();
        assert_eq!(before, after);
        assert_eq!(driver.stats().ticks(), 25);
        assert_eq!(driver.stats().mutations(), 0);
    }

    #[tokio::test]
    async fn ticks_keep_enrollment_within_bounds() {
        let records: Vec<CourseRecord> = (0..30)
            .map(|i| {
                let capacity = if i % 5 == 0 { None } else { Some(10 + i) };
                course(&format!("C{i:02}"), capacity, i % 7)
            })
            .collect();
        let store = store_with(records).await;
        let mut driver = SimulationDriver::new(
            store.clone(),
            SimulationConfig {
                batch_divisor: 3,
                unbounded: UnboundedPolicy::Walk { max_step: 4 },
                ..config()
            },
        );

        for _ in 0..200 {
            driver.tick().await;
        }

        for record in store.get_all().await.records() {
            if let Some(ceiling) = record.enrollment_ceiling() {
                assert!(record.enrollment <= ceiling, "{} over ceiling", record.course_no);
            }
            assert_eq!(record.all_student, record.enrollment + record.three_student);
        }
        assert!(driver.stats().mutations() > 0);
    }

    #[tokio::test]
    async fn skip_policy_never_touches_unbounded_courses() {
        let store = store_with(vec![course("A", None, 5), course("B", None, 9)]).await;
        let mut driver = SimulationDriver::new(
            store.clone(),
            SimulationConfig {
                batch_divisor: 1,
                ..config()
            },
        );

        let report = driver.tick().await;
        assert_eq!(report.selected, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.changed, 0);
        assert_eq!(store.get(&CourseId::from("B")).await.unwrap().enrollment, 9);
    }

    #[tokio::test]
    async fn cleared_store_yields_empty_ticks() {
        let store = store_with(vec![course("A", Some(5), 1)]).await;
        let mut driver = SimulationDriver::new(store.clone(), config());
        store.clear().await;
        let report = driver.tick().await;
        assert_eq!(report.selected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_driver_ticks_and_shuts_down() {
        let store = store_with(vec![course("A", Some(5), 1), course("B", Some(5), 2)]).await;
        let handle = SimulationDriver::new(
            store,
            SimulationConfig {
                tick_interval_ms: 1000,
                ..config()
            },
        )
        .spawn();
        let stats = handle.stats();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(stats.ticks() >= 2);

        handle.shutdown().await;
        let ticks_at_stop = stats.ticks();
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(stats.ticks(), ticks_at_stop);
    }
}
