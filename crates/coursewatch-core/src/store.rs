//! In-memory course store.
//!
//! [`CourseStore`] is the single owner of the catalog's mutable state. It
//! is a cheap-to-clone handle around an [`RwLock`]-guarded ordered map, so
//! the simulation driver and any number of request handlers can share it.
//!
//! All enrollment changes go through [`CourseStore::mutate`], which runs
//! under the write lock and clamps the result into the record's bounds.
//! Readers therefore see either the state before a mutation or the state
//! after it, never a record whose `ChooseStudent` and `AllStudent`
//! disagree.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use coursewatch_types::{CourseId, CourseRecord, Snapshot};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Errors that can occur when seeding the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Two seed records share an identifier.
    #[error("duplicate course identifier in seed data: {0}")]
    DuplicateId(CourseId),
}

/// Result of a successful [`CourseStore::mutate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentChange {
    /// The mutated course.
    pub course_id: CourseId,
    /// Enrollment before the mutation.
    pub before: u32,
    /// Enrollment after clamping.
    pub after: u32,
}

impl EnrollmentChange {
    /// Whether the mutation changed the stored value.
    pub const fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    courses: BTreeMap<CourseId, CourseRecord>,
    initialized: bool,
}

/// Shared, task-safe course store.
#[derive(Debug, Clone, Default)]
pub struct CourseStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl CourseStore {
    /// Create an empty, uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record set and mark the store initialized.
    ///
    /// Null pass-through fields are sanitized, and an enrollment above the
    /// record's ceiling is clamped down so the bound invariant holds from
    /// the first read. Returns the number of records loaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if two records share an
    /// identifier. The store is left untouched in that case.
    pub async fn seed(&self, records: Vec<CourseRecord>) -> Result<usize, StoreError> {
        let mut courses = BTreeMap::new();
        let mut clamped: usize = 0;

        for mut record in records {
            record.sanitize();
            if let Some(ceiling) = record.enrollment_ceiling()
                && record.enrollment > ceiling
            {
                record.set_enrollment(ceiling);
                clamped = clamped.saturating_add(1);
            }
            let id = record.course_no.clone();
            if courses.insert(id.clone(), record).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }

        if clamped > 0 {
            warn!(clamped, "Seed records exceeded their capacity and were clamped");
        }

        let count = courses.len();
        let mut inner = self.inner.write().await;
        inner.courses = courses;
        inner.initialized = true;
        info!(courses = count, "Course store seeded");
        Ok(count)
    }

    /// Return a consistent copy of every record.
    pub async fn get_all(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot::new(Utc::now(), inner.courses.values().cloned())
    }

    /// Return the records matching `predicate`, in identifier order.
    ///
    /// The predicate runs against a single read-locked view, so no result
    /// reflects a mutation that began after the call.
    pub async fn query<F>(&self, predicate: F) -> Vec<CourseRecord>
    where
        F: Fn(&CourseRecord) -> bool,
    {
        let inner = self.inner.read().await;
        inner
            .courses
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Look up a single record.
    pub async fn get(&self, id: &CourseId) -> Option<CourseRecord> {
        self.inner.read().await.courses.get(id).cloned()
    }

    /// Apply `target_fn` to one record's enrollment under exclusive access.
    ///
    /// `target_fn` sees the current record and returns the desired
    /// enrollment as a signed value. The store clamps it to
    /// `[0, enrollment_ceiling]` (`[0, u32::MAX]` without a ceiling) and
    /// keeps `AllStudent` in step.
    ///
    /// Unknown identifiers are a no-op and return `None`.
    pub async fn mutate<F>(&self, id: &CourseId, target_fn: F) -> Option<EnrollmentChange>
    where
        F: FnOnce(&CourseRecord) -> i64,
    {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.courses.get_mut(id) else {
            debug!(course = %id, "Mutation skipped: unknown course");
            return None;
        };

        let before = record.enrollment;
        let after = clamp_enrollment(target_fn(record), record.enrollment_ceiling());
        record.set_enrollment(after);

        Some(EnrollmentChange {
            course_id: id.clone(),
            before,
            after,
        })
    }

    /// All identifiers in order.
    pub async fn ids(&self) -> Vec<CourseId> {
        self.inner.read().await.courses.keys().cloned().collect()
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.courses.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.courses.is_empty()
    }

    /// Whether [`CourseStore::seed`] has completed.
    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.initialized
    }

    /// Drop every record and mark the store uninitialized.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.courses.clear();
        inner.initialized = false;
        info!("Course store cleared");
    }
}

/// Clamp a signed enrollment target into `[0, ceiling]`.
pub fn clamp_enrollment(target: i64, ceiling: Option<u32>) -> u32 {
    let upper = ceiling.unwrap_or(u32::MAX);
    if target <= 0 {
        return 0;
    }
    u32::try_from(target).unwrap_or(u32::MAX).min(upper)
}
