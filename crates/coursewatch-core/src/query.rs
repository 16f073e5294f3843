//! Filtered reads over the course store.
//!
//! [`QueryService`] is a stateless facade: it validates a [`CourseQuery`],
//! compiles it into a [`CourseFilter`], and evaluates that filter against
//! one atomic read of the store. It never mutates anything.

use coursewatch_types::{CourseQuery, CourseRecord};

use crate::store::CourseStore;

/// Largest page a single query may request.
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Longest accepted value for any text criterion, in characters.
pub const MAX_CRITERION_LEN: usize = 128;

/// Languages the query body may request.
const LANGUAGES: &[&str] = &["zh", "en"];

/// Errors returned by [`QueryService::search`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The criteria were malformed. Maps to a client error.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    /// The store has not been seeded yet (or was cleared at shutdown).
    #[error("course data not initialized")]
    NotReady,
}

/// A validated, normalized form of [`CourseQuery`].
///
/// Empty criteria are `None` and match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    semester: Option<String>,
    course_no: Option<String>,
    course_name: Option<String>,
    course_teacher: Option<String>,
    dimension: Option<String>,
    offset: usize,
    limit: Option<usize>,
}

impl CourseFilter {
    /// Validate and normalize query criteria.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCriteria`] for a zero or oversized
    /// `Limit`, an unknown `Language`, or an over-long text criterion.
    pub fn from_query(query: &CourseQuery) -> Result<Self, QueryError> {
        for (name, value) in [
            ("Semester", &query.semester),
            ("CourseNo", &query.course_no),
            ("CourseName", &query.course_name),
            ("CourseTeacher", &query.course_teacher),
            ("Dimension", &query.dimension),
        ] {
            if value.chars().count() > MAX_CRITERION_LEN {
                return Err(QueryError::InvalidCriteria(format!(
                    "{name} exceeds {MAX_CRITERION_LEN} characters"
                )));
            }
        }

        if !query.language.is_empty() && !LANGUAGES.contains(&query.language.as_str()) {
            return Err(QueryError::InvalidCriteria(format!(
                "unsupported Language {:?}",
                query.language
            )));
        }

        if let Some(limit) = query.limit
            && (limit == 0 || limit > MAX_PAGE_SIZE)
        {
            return Err(QueryError::InvalidCriteria(format!(
                "Limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
            )));
        }

        Ok(Self {
            semester: non_empty(&query.semester),
            course_no: non_empty(query.course_no.trim()).map(|s| s.to_uppercase()),
            course_name: non_empty(query.course_name.trim()),
            course_teacher: non_empty(query.course_teacher.trim()),
            dimension: non_empty(&query.dimension),
            offset: query.offset.unwrap_or(0),
            limit: query.limit,
        })
    }

    /// Whether `record` satisfies every criterion.
    pub fn matches(&self, record: &CourseRecord) -> bool {
        self.semester.as_ref().is_none_or(|s| record.semester == *s)
            && self
                .course_no
                .as_ref()
                .is_none_or(|no| record.course_no.as_str().to_uppercase().contains(no.as_str()))
            && self
                .course_name
                .as_ref()
                .is_none_or(|name| record.course_name.contains(name.as_str()))
            && self
                .course_teacher
                .as_ref()
                .is_none_or(|teacher| record.course_teacher.contains(teacher.as_str()))
            && self.dimension.as_ref().is_none_or(|d| record.dimension == *d)
    }

    /// Apply the pagination window to an ordered result list.
    pub fn paginate(&self, records: Vec<CourseRecord>) -> Vec<CourseRecord> {
        records
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Stateless query facade over a [`CourseStore`].
#[derive(Debug, Clone)]
pub struct QueryService {
    store: CourseStore,
}

impl QueryService {
    /// Create a service reading from `store`.
    pub const fn new(store: CourseStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &CourseStore {
        &self.store
    }

    /// Return the records matching `query`, in identifier order.
    ///
    /// Zero matches is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCriteria`] for malformed criteria and
    /// [`QueryError::NotReady`] before the store is seeded.
    pub async fn search(&self, query: &CourseQuery) -> Result<Vec<CourseRecord>, QueryError> {
        let filter = CourseFilter::from_query(query)?;
        if !self.store.is_initialized().await {
            return Err(QueryError::NotReady);
        }
        let matches = self.store.query(|record| filter.matches(record)).await;
        Ok(filter.paginate(matches))
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
