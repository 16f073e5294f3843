//! Terminal client for Coursewatch.
//!
//! Polls the catalog's query endpoint, diffs each snapshot against the
//! previous one and prints the courses whose enrollment moved.
//!
//! # Architecture
//!
//! ```text
//! HttpSource (fetch) --> SnapshotDiffer (diff) --> Renderer (frame) --> stdout
//!        ^                                                                  |
//!        +------------------------- PollLoop (sleep) ----------------------+
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod poll;
pub mod render;

pub use config::ClientConfig;
pub use diff::{Change, FieldDelta, SnapshotDiffer};
pub use error::ClientError;
pub use fetch::{HttpSource, SnapshotSource};
pub use poll::{CycleOutcome, PollLoop};
pub use render::{Frame, Renderer};
