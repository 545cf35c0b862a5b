//! Volume analysis over timestamped files.
//!
//! `bounds.rs` finds each file's earliest/latest timestamps with short
//! scans; `search.rs` estimates byte volume inside a time range (mmap
//! binary search with a linear-scan fallback); `histogram.rs` bins the
//! estimates across files; `analyzer.rs` is the caller-facing façade.

pub mod analyzer;
pub mod bounds;
pub mod histogram;
pub mod search;

pub use analyzer::{VolumeAnalyzer, VolumeDistribution};
pub use bounds::{BoundsExtractor, BoundsReport, TimeBounds};
pub use histogram::HistogramBuilder;
pub use search::{open_counter, ByteRangeCounter, LinearScanner, MmapSearcher, SearchBound};
