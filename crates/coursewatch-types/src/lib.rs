//! Shared type definitions for Coursewatch.
//!
//! This crate is the single source of truth for the wire types exchanged
//! between the catalog server and the terminal client. Field names on the
//! wire follow the upstream course-query API (`CourseNo`, `ChooseStudent`,
//! `Restrict2`, ...) so records can be loaded from it verbatim.
//!
//! # Modules
//!
//! - [`ids`] -- The [`CourseId`] newtype
//! - [`record`] -- [`CourseRecord`], one course with its enrollment counts
//! - [`query`] -- [`CourseQuery`], the filter criteria accepted by the API
//! - [`snapshot`] -- [`Snapshot`], an immutable point-in-time record set

pub mod ids;
pub mod query;
pub mod record;
pub mod snapshot;

pub use ids::CourseId;
pub use query::CourseQuery;
pub use record::CourseRecord;
pub use snapshot::Snapshot;
