//! Seed sources for the course store.
//!
//! The catalog is rebuilt from scratch on every start. [`load_seed`]
//! resolves the configured [`SeedSource`] into a record list:
//!
//! - **Upstream** -- POST a whole-semester query to the real course API
//! - **File** -- read a JSON array previously saved from that API
//! - **Synthetic** -- generate plausible demo courses locally
//!
//! Any failure here is fatal to startup; the server has nothing to serve
//! without a seed.

use std::time::Duration;

use coursewatch_types::{CourseQuery, CourseRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::{SeedConfig, SeedSource};

/// Department codes used by the synthetic generator.
const DEPARTMENTS: &[&str] = &["CS", "EE", "ME", "MA", "GE", "FL"];

/// Course name stems used by the synthetic generator.
const SUBJECTS: &[&str] = &[
    "Data Structures",
    "Linear Algebra",
    "Operating Systems",
    "Signals and Systems",
    "Thermodynamics",
    "Calculus",
    "Academic Writing",
    "Computer Networks",
    "Probability",
    "微積分",
    "資料結構",
    "計算機網路",
];

/// Semester label used when none is configured.
const DEMO_SEMESTER: &str = "demo";

/// Errors that can occur while loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The upstream HTTP request failed or returned an error status.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The seed file could not be read.
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// The seed payload was not a JSON array of course records.
    #[error("malformed seed data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The seed resolved to zero courses.
    #[error("seed source returned no courses")]
    Empty,
}

/// Load the initial record set from the configured source.
///
/// # Errors
///
/// Returns a [`SeedError`] if the source is unreachable, unreadable,
/// malformed, or empty.
pub async fn load_seed(config: &SeedConfig) -> Result<Vec<CourseRecord>, SeedError> {
    let records = match &config.source {
        SeedSource::Upstream { url } => {
            info!(url, semester = config.semester, "Fetching seed data from upstream");
            fetch_upstream(url, &config.semester, Duration::from_millis(config.timeout_ms)).await?
        }
        SeedSource::File { path } => {
            info!(path = %path.display(), "Reading seed data from file");
            let contents = tokio::fs::read_to_string(path).await?;
            parse_records(&contents)?
        }
        SeedSource::Synthetic { count, rng_seed } => {
            let mut rng = rng_seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
            let semester = if config.semester.is_empty() {
                DEMO_SEMESTER
            } else {
                config.semester.as_str()
            };
            info!(count, semester, "Generating synthetic seed data");
            synthetic_courses(&mut rng, *count, semester)
        }
    };

    if records.is_empty() {
        return Err(SeedError::Empty);
    }
    Ok(records)
}

/// Parse a JSON array of upstream course records.
///
/// # Errors
///
/// Returns [`SeedError::Malformed`] if the text is not such an array.
pub fn parse_records(json: &str) -> Result<Vec<CourseRecord>, SeedError> {
    Ok(serde_json::from_str(json)?)
}

/// POST a semester-wide query to the upstream API.
async fn fetch_upstream(
    url: &str,
    semester: &str,
    timeout: Duration,
) -> Result<Vec<CourseRecord>, SeedError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    // Upstream treats a single-space teacher filter as "any teacher".
    let body = CourseQuery {
        course_teacher: String::from(" "),
        ..CourseQuery::for_semester(semester)
    };

    let records = client
        .post(url)
        .header("Content-Type", "application/json; charset=utf-8")
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<CourseRecord>>()
        .await?;

    info!(courses = records.len(), "Upstream seed data received");
    Ok(records)
}

/// Generate `count` demo courses.
///
/// Roughly one course in ten has no declared capacity, so both simulation
/// paths are exercised.
pub fn synthetic_courses(rng: &mut impl Rng, count: usize, semester: &str) -> Vec<CourseRecord> {
    (0..count)
        .map(|index| {
            let dept = DEPARTMENTS
                .get(index.checked_rem(DEPARTMENTS.len()).unwrap_or(0))
                .copied()
                .unwrap_or("GE");
            let subject = SUBJECTS
                .get(rng.random_range(0..SUBJECTS.len()))
                .copied()
                .unwrap_or("Seminar");
            let capacity = if index % 10 == 9 {
                None
            } else {
                Some(rng.random_range(20_u32..=80))
            };

            let mut record = CourseRecord::new(
                format!("{dept}{:07}", 1_000_000_usize.saturating_add(index)),
                subject,
                capacity,
            );
            record.semester = semester.to_owned();
            record.dimension = dept.to_owned();
            record.course_teacher = format!("Lecturer {}", index % 17);
            record.class_room_no = format!("TR-{}", rng.random_range(101_u32..=512));
            record.three_student = rng.random_range(0_u32..=3);

            let upper = record.enrollment_ceiling().unwrap_or(60);
            let enrollment = rng.random_range(0..=upper);
            record.set_enrollment(enrollment);
            record
        })
        .collect()
}
