//! Course record as served by the catalog API.
//!
//! Only the fields the catalog actually reasons about are typed. Every
//! other upstream field (credit points, schedule strings, notes, ...) is
//! carried through untouched in [`CourseRecord::metadata`] so the server
//! returns exactly what it loaded, plus the current enrollment.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ids::CourseId;

/// Pass-through string fields that upstream may send as `null`.
///
/// These are normalized to `""` by [`CourseRecord::sanitize`].
pub const NULLABLE_STR_FIELDS: &[&str] = &[
    "CreditPoint",
    "RequireOption",
    "AllYear",
    "Restrict1",
    "NTURestrict",
    "NTNURestrict",
    "CourseTimes",
    "PracticalTimes",
    "Node",
    "Contents",
];

/// Pass-through integer fields that upstream may send as `null`.
///
/// These are normalized to `0` by [`CourseRecord::sanitize`].
pub const NULLABLE_INT_FIELDS: &[&str] = &["NTU_People", "NTNU_People", "AbroadPeople"];

/// A single course and its live enrollment counts.
///
/// Invariants maintained by the store (not by this type):
///
/// - `enrollment <= enrollment_ceiling()` when a ceiling is declared
/// - `all_student == enrollment + three_student`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CourseRecord {
    /// Semester code (e.g. `1142`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub semester: String,
    /// Unique course identifier.
    pub course_no: CourseId,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_name: String,
    /// Teacher name(s).
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_teacher: String,
    /// Department / dimension code.
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimension: String,
    /// Classroom designation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_room_no: String,
    /// Declared capacity as sent upstream (a decimal string, may be empty).
    ///
    /// Use [`CourseRecord::capacity`] for the parsed value.
    #[serde(rename = "Restrict2", default, deserialize_with = "null_as_default")]
    pub restrict2: String,
    /// Students currently enrolled through regular selection.
    #[serde(rename = "ChooseStudent", default, deserialize_with = "null_as_default")]
    pub enrollment: u32,
    /// Seats held by the inter-university allocation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub three_student: u32,
    /// Total head count (`enrollment + three_student`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub all_student: u32,
    /// Every other upstream field, passed through verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl CourseRecord {
    /// Create a minimal record with the given capacity and no enrollment.
    ///
    /// A capacity of `None` produces an empty `Restrict2`, i.e. a course
    /// without a declared ceiling.
    pub fn new(course_no: impl Into<CourseId>, course_name: impl Into<String>, capacity: Option<u32>) -> Self {
        Self {
            semester: String::new(),
            course_no: course_no.into(),
            course_name: course_name.into(),
            course_teacher: String::new(),
            dimension: String::new(),
            class_room_no: String::new(),
            restrict2: capacity.map(|c| c.to_string()).unwrap_or_default(),
            enrollment: 0,
            three_student: 0,
            all_student: 0,
            metadata: Map::new(),
        }
    }

    /// Parsed capacity, or `None` when the course declares no ceiling.
    ///
    /// Empty, non-numeric and zero values all mean "no ceiling".
    pub fn capacity(&self) -> Option<u32> {
        self.restrict2
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|capacity| *capacity > 0)
    }

    /// Upper bound for [`CourseRecord::enrollment`].
    ///
    /// Reserved seats count against capacity, so the ceiling is
    /// `capacity - three_student` (saturating at zero).
    pub fn enrollment_ceiling(&self) -> Option<u32> {
        self.capacity()
            .map(|capacity| capacity.saturating_sub(self.three_student))
    }

    /// Set the enrollment and keep `all_student` consistent with it.
    pub const fn set_enrollment(&mut self, enrollment: u32) {
        self.enrollment = enrollment;
        self.all_student = enrollment.saturating_add(self.three_student);
    }

    /// Replace upstream `null`s in pass-through fields with empty values.
    pub fn sanitize(&mut self) {
        for field in NULLABLE_STR_FIELDS {
            if self.metadata.get(*field).is_some_and(Value::is_null) {
                self.metadata
                    .insert((*field).to_owned(), Value::String(String::new()));
            }
        }
        for field in NULLABLE_INT_FIELDS {
            if self.metadata.get(*field).is_some_and(Value::is_null) {
                self.metadata.insert((*field).to_owned(), Value::from(0_u32));
            }
        }
    }
}

/// Deserialize a value, mapping JSON `null` to `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upstream_json() -> Value {
        serde_json::json!({
            "Semester": "1142",
            "CourseNo": "CS1001301",
            "CourseName": "資料結構",
            "CourseTeacher": null,
            "Dimension": "",
            "CreditPoint": "3",
            "ChooseStudent": 41,
            "Restrict1": "0",
            "Restrict2": "50",
            "ThreeStudent": 2,
            "AllStudent": 43,
            "ClassRoomNo": "TR-313",
            "ThreeNode": null,
            "Contents": null,
            "NTU_People": null
        })
    }

    #[test]
    fn decodes_upstream_record() {
        let record: CourseRecord = serde_json::from_value(upstream_json()).unwrap();
        assert_eq!(record.course_no.as_str(), "CS1001301");
        assert_eq!(record.course_teacher, "");
        assert_eq!(record.enrollment, 41);
        assert_eq!(record.capacity(), Some(50));
        assert_eq!(record.enrollment_ceiling(), Some(48));
        assert_eq!(record.metadata.get("CreditPoint"), Some(&Value::from("3")));
    }

    #[test]
    fn sanitize_replaces_known_nulls_only() {
        let mut record: CourseRecord = serde_json::from_value(upstream_json()).unwrap();
        record.sanitize();
        assert_eq!(record.metadata.get("Contents"), Some(&Value::from("")));
        assert_eq!(record.metadata.get("NTU_People"), Some(&Value::from(0)));
        // ThreeNode is optional upstream and stays null.
        assert_eq!(record.metadata.get("ThreeNode"), Some(&Value::Null));
    }

    #[test]
    fn encodes_with_upstream_field_names() {
        let record: CourseRecord = serde_json::from_value(upstream_json()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ChooseStudent"], 41);
        assert_eq!(json["Restrict2"], "50");
        assert_eq!(json["ClassRoomNo"], "TR-313");
        assert_eq!(json["CreditPoint"], "3");
    }

    #[test]
    fn missing_or_zero_capacity_is_unbounded() {
        let mut record = CourseRecord::new("X1", "Seminar", None);
        assert_eq!(record.capacity(), None);
        record.restrict2 = String::from("0");
        assert_eq!(record.capacity(), None);
        record.restrict2 = String::from("n/a");
        assert_eq!(record.enrollment_ceiling(), None);
    }

    #[test]
    fn set_enrollment_updates_head_count() {
        let mut record = CourseRecord::new("X1", "Seminar", Some(30));
        record.three_student = 3;
        record.set_enrollment(20);
        assert_eq!(record.all_student, 23);
    }

    #[test]
    fn reserved_seats_beyond_capacity_leave_zero_ceiling() {
        let mut record = CourseRecord::new("X1", "Seminar", Some(5));
        record.three_student = 9;
        assert_eq!(record.enrollment_ceiling(), Some(0));
    }
}
