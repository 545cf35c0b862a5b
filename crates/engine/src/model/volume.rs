//! VolumePoint — one time-binned histogram data point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One histogram bin's worth of volume. `size_bytes` is a byte-volume
/// estimate (bytes between two discovered offsets), not an exact record
/// count; `count` is only populated when a counting strategy can provide
/// exact line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub bin_start: DateTime<Utc>,
    pub bin_end: DateTime<Utc>,
    pub count: u64,
    pub size_bytes: u64,
    pub file_count: usize,
}

impl VolumePoint {
    pub fn empty(bin_start: DateTime<Utc>, bin_end: DateTime<Utc>) -> Self {
        Self {
            bin_start,
            bin_end,
            count: 0,
            size_bytes: 0,
            file_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_round_trip() {
        let point = VolumePoint {
            bin_start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            bin_end: Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
            count: 0,
            size_bytes: 4096,
            file_count: 3,
        };
        let json = serde_json::to_string(&point).expect("serialize");
        let back: VolumePoint = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, point);
    }

    #[test]
    fn empty_point_has_no_volume() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let point = VolumePoint::empty(start, end);
        assert!(point.is_empty());
        assert_eq!(point.file_count, 0);
    }
}
