//! Snapshot-to-snapshot enrollment diffing.
//!
//! [`SnapshotDiffer`] keeps one baseline value per course: the enrollment
//! seen in the immediately preceding snapshot. Every call to
//! [`SnapshotDiffer::diff`] classifies each course against that baseline
//! and then replaces the baseline wholesale with the new snapshot, so a
//! delta is never computed against a value older than one snapshot.
//!
//! Per-course state machine:
//!
//! ```text
//! unseen --(present)--> tracked        classified New
//! tracked --(present)--> tracked       Increased / Decreased / Unchanged
//! tracked --(absent)---> unseen        classified Removed
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use coursewatch_types::{CourseId, Snapshot};

/// The field a delta describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `ChooseStudent`.
    Enrollment,
}

/// Classification of one field between two consecutive snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// First observation; there is no baseline to compare against.
    New,
    /// The value went up.
    Increased,
    /// The value went down.
    Decreased,
    /// The value is the same as last time.
    Unchanged,
    /// The course disappeared from the snapshot.
    Removed,
}

/// The classified difference of one field of one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDelta {
    /// The course.
    pub course_id: CourseId,
    /// Which field.
    pub field: Field,
    /// Baseline value, absent for [`Change::New`].
    pub previous: Option<u32>,
    /// New value, absent for [`Change::Removed`].
    pub current: Option<u32>,
    /// Classification.
    pub change: Change,
}

impl FieldDelta {
    /// Whether the delta represents a movement of the value.
    pub const fn is_movement(&self) -> bool {
        matches!(self.change, Change::Increased | Change::Decreased)
    }
}

/// Tracks the last-seen enrollment per course and classifies changes.
#[derive(Debug, Default)]
pub struct SnapshotDiffer {
    baseline: BTreeMap<CourseId, u32>,
    snapshots_seen: u64,
}

impl SnapshotDiffer {
    /// Create a differ with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots diffed so far.
    pub const fn snapshots_seen(&self) -> u64 {
        self.snapshots_seen
    }

    /// Baseline enrollment for `id`, if tracked.
    pub fn baseline(&self, id: &CourseId) -> Option<u32> {
        self.baseline.get(id).copied()
    }

    /// Number of tracked courses.
    pub fn tracked(&self) -> usize {
        self.baseline.len()
    }

    /// Classify `snapshot` against the baseline, then adopt it as the new
    /// baseline.
    ///
    /// Deltas come back in identifier order, removals included.
    pub fn diff(&mut self, snapshot: &Snapshot) -> Vec<FieldDelta> {
        let mut deltas: Vec<FieldDelta> = Vec::with_capacity(snapshot.len());

        for record in snapshot.records() {
            let current = record.enrollment;
            let previous = self.baseline.get(&record.course_no).copied();
            let change = previous.map_or(Change::New, |previous| match current.cmp(&previous) {
                Ordering::Greater => Change::Increased,
                Ordering::Less => Change::Decreased,
                Ordering::Equal => Change::Unchanged,
            });
            deltas.push(FieldDelta {
                course_id: record.course_no.clone(),
                field: Field::Enrollment,
                previous,
                current: Some(current),
                change,
            });
        }

        for (id, previous) in &self.baseline {
            if snapshot.get(id).is_none() {
                deltas.push(FieldDelta {
                    course_id: id.clone(),
                    field: Field::Enrollment,
                    previous: Some(*previous),
                    current: None,
                    change: Change::Removed,
                });
            }
        }
        deltas.sort_by(|a, b| a.course_id.cmp(&b.course_id));

        self.baseline = snapshot
            .records()
            .map(|record| (record.course_no.clone(), record.enrollment))
            .collect();
        self.snapshots_seen = self.snapshots_seen.saturating_add(1);

        deltas
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use coursewatch_types::CourseRecord;

    use super::*;

    fn snapshot(entries: &[(&str, u32)]) -> Snapshot {
        Snapshot::now(entries.iter().map(|(id, enrollment)| {
            let mut record = CourseRecord::new(*id, format!("Course {id}"), Some(100));
            record.set_enrollment(*enrollment);
            record
        }))
    }

    fn changes(deltas: &[FieldDelta]) -> Vec<(&str, Change)> {
        deltas
            .iter()
            .map(|d| (d.course_id.as_str(), d.change))
            .collect()
    }

    #[test]
    fn first_snapshot_is_all_new() {
        let mut differ = SnapshotDiffer::new();
        let deltas = differ.diff(&snapshot(&[("A", 10), ("B", 0), ("C", 99)]));
        assert!(deltas.iter().all(|d| d.change == Change::New));
        assert!(deltas.iter().all(|d| d.previous.is_none()));
        assert_eq!(differ.tracked(), 3);
    }

    #[test]
    fn classifies_increase_unchanged_and_new() {
        let mut differ = SnapshotDiffer::new();
        differ.diff(&snapshot(&[("A", 10), ("B", 5)]));
        let deltas = differ.diff(&snapshot(&[("A", 12), ("B", 5), ("C", 1)]));
        assert_eq!(
            changes(&deltas),
            vec![
                ("A", Change::Increased),
                ("B", Change::Unchanged),
                ("C", Change::New),
            ]
        );
        assert_eq!(deltas[0].previous, Some(10));
        assert_eq!(deltas[0].current, Some(12));
    }

    #[test]
    fn absent_courses_are_removed_and_untracked() {
        let mut differ = SnapshotDiffer::new();
        differ.diff(&snapshot(&[("A", 10), ("B", 5)]));
        differ.diff(&snapshot(&[("A", 12), ("B", 5), ("C", 1)]));
        let deltas = differ.diff(&snapshot(&[("A", 12)]));
        assert_eq!(
            changes(&deltas),
            vec![
                ("A", Change::Unchanged),
                ("B", Change::Removed),
                ("C", Change::Removed),
            ]
        );
        assert_eq!(deltas[1].previous, Some(5));
        assert_eq!(deltas[1].current, None);
        assert_eq!(differ.tracked(), 1);
        assert_eq!(differ.baseline(&CourseId::from("B")), None);
    }

    #[test]
    fn reappearing_course_is_new_again() {
        let mut differ = SnapshotDiffer::new();
        differ.diff(&snapshot(&[("A", 10)]));
        differ.diff(&snapshot(&[]));
        let deltas = differ.diff(&snapshot(&[("A", 30)]));
        assert_eq!(changes(&deltas), vec![("A", Change::New)]);
    }

    #[test]
    fn baseline_is_single_step() {
        let mut differ = SnapshotDiffer::new();
        differ.diff(&snapshot(&[("A", 10)]));
        differ.diff(&snapshot(&[("A", 20)]));
        // 15 is above the original 10 but below the previous 20.
        let deltas = differ.diff(&snapshot(&[("A", 15)]));
        assert_eq!(changes(&deltas), vec![("A", Change::Decreased)]);
        assert_eq!(deltas[0].previous, Some(20));
        assert_eq!(differ.baseline(&CourseId::from("A")), Some(15));
    }

    #[test]
    fn diff_is_deterministic() {
        let s1 = snapshot(&[("B", 1), ("A", 2), ("C", 3)]);
        let s2 = snapshot(&[("C", 2), ("A", 2), ("D", 9)]);

        let mut first = SnapshotDiffer::new();
        let mut second = SnapshotDiffer::new();
        first.diff(&s1);
        second.diff(&s1);
        assert_eq!(first.diff(&s2), second.diff(&s2));
    }

    #[test]
    fn movement_flag() {
        let mut differ = SnapshotDiffer::new();
        differ.diff(&snapshot(&[("A", 1), ("B", 1)]));
        let deltas = differ.diff(&snapshot(&[("A", 0), ("B", 1)]));
        assert!(deltas[0].is_movement());
        assert!(!deltas[1].is_movement());
        assert_eq!(differ.snapshots_seen(), 2);
    }
}
