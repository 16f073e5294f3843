//! Course identifier newtype.
//!
//! Upstream course numbers are short alphanumeric codes (e.g. `CS1001301`),
//! not UUIDs, so the identifier wraps a [`String`]. Ordering is plain
//! lexicographic ordering of the code, which is also the display order
//! used by the terminal client.

use serde::{Deserialize, Serialize};

/// Unique, process-stable identifier of a course (`CourseNo` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    /// Borrow the raw course code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CourseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseId {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl From<String> for CourseId {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for CourseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
