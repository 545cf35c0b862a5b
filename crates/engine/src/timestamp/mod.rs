//! Timestamp detection and parsing.
//!
//! `pattern.rs` holds the fixed, priority-ordered pattern library;
//! `extract.rs` scores patterns against file samples, parses individual
//! lines with the hybrid best-then-all policy, and classifies files as
//! logs by content.

pub mod extract;
pub mod pattern;

pub use extract::{PatternDetectionResult, TimestampExtractor};
pub use pattern::{pattern_library, Anchoring, TimeLayout, TimestampPattern};
