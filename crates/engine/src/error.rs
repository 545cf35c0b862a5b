//! Error — the engine-wide error taxonomy.
//!
//! Batch operations never surface these for individual files; they warn,
//! skip, and keep going. Single-file entry points propagate them so the
//! caller sees the file and the underlying cause.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No pattern in the library produced a timestamp for a line.
    /// Callers treat this as "not a log line", not as a failure.
    #[error("no timestamp found in line")]
    NoTimestamp,

    /// The file cannot back a memory map (not a regular file, empty, or
    /// the map itself failed). Recovered by the linear-scan strategy.
    #[error("cannot memory-map {}: {reason}", .path.display())]
    UnsupportedSource { path: PathBuf, reason: String },

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("no valid timestamps found in selected files")]
    NoValidBounds,
}
