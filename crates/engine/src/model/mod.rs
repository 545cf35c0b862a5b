//! Shared data model: time ranges, histogram points, and the working-set
//! accessor seam the engine consumes selection state through.

pub mod range;
pub mod volume;
pub mod working;

pub use range::TimeRange;
pub use volume::VolumePoint;
pub use working::{FileEntry, SelectAll, Selection};
