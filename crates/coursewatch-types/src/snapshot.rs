//! Point-in-time record sets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::ids::CourseId;
use crate::record::CourseRecord;

/// An immutable copy of course records captured at one instant.
///
/// Records are keyed (and iterated) by identifier. A snapshot is never
/// modified after construction; callers that need a newer view take a
/// new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    courses: BTreeMap<CourseId, CourseRecord>,
}

impl Snapshot {
    /// Build a snapshot from records. A duplicate identifier keeps the
    /// last record seen.
    pub fn new(captured_at: DateTime<Utc>, records: impl IntoIterator<Item = CourseRecord>) -> Self {
        let courses = records
            .into_iter()
            .map(|record| (record.course_no.clone(), record))
            .collect();
        Self {
            captured_at,
            courses,
        }
    }

    /// Build a snapshot stamped with the current time.
    pub fn now(records: impl IntoIterator<Item = CourseRecord>) -> Self {
        Self::new(Utc::now(), records)
    }

    /// When the snapshot was captured.
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Look up one course.
    pub fn get(&self, id: &CourseId) -> Option<&CourseRecord> {
        self.courses.get(id)
    }

    /// Iterate records in identifier order.
    pub fn records(&self) -> impl Iterator<Item = &CourseRecord> {
        self.courses.values()
    }

    /// Iterate identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &CourseId> {
        self.courses.keys()
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the snapshot holds no courses.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Consume the snapshot, returning its records in identifier order.
    pub fn into_records(self) -> Vec<CourseRecord> {
        self.courses.into_values().collect()
    }
}
