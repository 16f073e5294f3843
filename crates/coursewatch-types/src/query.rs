//! Query criteria accepted by the catalog API.
//!
//! The body mirrors the upstream course-query request so existing
//! clients can point at the catalog unchanged. String criteria left empty
//! impose no constraint. The integer flags (`ForeignLanguage`,
//! `OnlyGeneral`, ...) are accepted for compatibility but the in-memory
//! catalog does not filter on them.

use serde::{Deserialize, Serialize};

/// Filter and pagination criteria for a catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CourseQuery {
    /// Exact semester match.
    pub semester: String,
    /// Case-insensitive substring of the course identifier.
    pub course_no: String,
    /// Substring of the course name (surrounding whitespace ignored).
    pub course_name: String,
    /// Substring of the teacher name (surrounding whitespace ignored).
    pub course_teacher: String,
    /// Exact department / dimension match.
    pub dimension: String,
    /// Accepted, not filtered on.
    pub course_notes: String,
    /// Accepted, not filtered on.
    pub campus_notes: String,
    /// Accepted, not filtered on.
    pub foreign_language: u8,
    /// Accepted, not filtered on.
    pub only_general: u8,
    /// Accepted, not filtered on. The misspelling is the upstream wire name.
    #[serde(rename = "OnleyNTUST")]
    pub only_ntust: u8,
    /// Accepted, not filtered on.
    pub only_master: u8,
    /// Accepted, not filtered on.
    pub only_under_graduate: u8,
    /// Accepted, not filtered on.
    pub only_node: u8,
    /// Response language, `zh` or `en`.
    pub language: String,
    /// Number of matching records to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Maximum number of records to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            semester: String::new(),
            course_no: String::new(),
            course_name: String::new(),
            course_teacher: String::new(),
            dimension: String::new(),
            course_notes: String::new(),
            campus_notes: String::new(),
            foreign_language: 0,
            only_general: 0,
            only_ntust: 0,
            only_master: 0,
            only_under_graduate: 0,
            only_node: 0,
            language: String::from("zh"),
            offset: None,
            limit: None,
        }
    }
}

impl CourseQuery {
    /// Criteria matching every course of one semester.
    pub fn for_semester(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            ..Self::default()
        }
    }

    /// Restrict to identifiers containing `course_no`.
    #[must_use]
    pub fn with_course_no(mut self, course_no: impl Into<String>) -> Self {
        self.course_no = course_no.into();
        self
    }

    /// Restrict to names containing `course_name`.
    #[must_use]
    pub fn with_course_name(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = course_name.into();
        self
    }

    /// Restrict to one department.
    #[must_use]
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = dimension.into();
        self
    }

    /// Apply pagination bounds.
    #[must_use]
    pub const fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_upstream_request_body() {
        let body = serde_json::json!({
            "Semester": "1142",
            "CourseNo": "",
            "CourseName": "",
            "CourseTeacher": " ",
            "Dimension": "",
            "CourseNotes": "",
            "CampusNotes": "",
            "ForeignLanguage": 0,
            "OnlyIntensive": 0,
            "OnlyGeneral": 0,
            "OnleyNTUST": 1,
            "OnlyMaster": 0,
            "OnlyUnderGraduate": 0,
            "OnlyNode": 0,
            "Language": "zh"
        });
        let query: CourseQuery = serde_json::from_value(body).unwrap();
        assert_eq!(query.semester, "1142");
        assert_eq!(query.only_ntust, 1);
        assert_eq!(query.limit, None);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let query: CourseQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, CourseQuery::default());
        assert_eq!(query.language, "zh");
    }

    #[test]
    fn pagination_is_omitted_when_unset() {
        let json = serde_json::to_value(CourseQuery::for_semester("1142")).unwrap();
        assert!(json.get("Limit").is_none());
        let json = serde_json::to_value(CourseQuery::default().with_page(10, 5)).unwrap();
        assert_eq!(json["Offset"], 10);
        assert_eq!(json["Limit"], 5);
    }
}
