//! Model — EngineConfig and its defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Non-empty lines sampled from the top of a file for pattern detection.
    pub detection_sample_lines: usize,
    /// Cap on the forward scan when looking for the earliest timestamp.
    pub max_bound_scan_lines: usize,
    /// Tail window read when looking for the latest timestamp.
    pub tail_read_bytes: u64,
    /// Bin count used when the caller passes zero.
    pub default_bin_count: usize,
    /// Content classification: minimum matching lines in the sample.
    pub min_match_count: usize,
    /// Content classification: minimum matches / sampled-lines ratio.
    pub min_confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection_sample_lines: 10,
            max_bound_scan_lines: 100,
            tail_read_bytes: 64 * 1024,
            default_bin_count: 20,
            min_match_count: 2,
            min_confidence: 0.3,
        }
    }
}

impl EngineConfig {
    /// Validate that configuration values are sane.
    pub fn validate(&self) -> Result<(), String> {
        if self.detection_sample_lines == 0 {
            return Err("detection_sample_lines must be > 0".to_string());
        }
        if self.max_bound_scan_lines == 0 {
            return Err("max_bound_scan_lines must be > 0".to_string());
        }
        if self.tail_read_bytes == 0 {
            return Err("tail_read_bytes must be > 0".to_string());
        }
        if self.default_bin_count == 0 {
            return Err("default_bin_count must be > 0".to_string());
        }
        if self.min_match_count == 0 {
            return Err("min_match_count must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence must be within 0.0..=1.0".to_string());
        }
        Ok(())
    }
}
