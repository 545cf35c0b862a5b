//! TimestampExtractor — per-file pattern detection, hybrid line parsing,
//! and content-based log classification.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::conf::EngineConfig;
use crate::error::EngineError;
use crate::timestamp::pattern::{pattern_library, TimestampPattern};

/// Outcome of sampling a file for its dominant timestamp format.
#[derive(Debug, Clone, Copy)]
pub struct PatternDetectionResult {
    pub pattern: Option<&'static TimestampPattern>,
    /// First timestamp the winning pattern parsed from the sample.
    pub sample_timestamp: Option<DateTime<Utc>>,
    /// Sampled non-empty lines.
    pub lines_sampled: usize,
    /// Lines the winning pattern matched.
    pub match_count: usize,
    /// `match_count / lines_sampled`, 0.0 when nothing was sampled.
    pub confidence: f64,
}

impl PatternDetectionResult {
    fn none(lines_sampled: usize) -> Self {
        Self {
            pattern: None,
            sample_timestamp: None,
            lines_sampled,
            match_count: 0,
            confidence: 0.0,
        }
    }
}

/// Stateless timestamp extraction over the shared pattern library.
/// Cheap to clone; holds only configuration thresholds.
#[derive(Debug, Clone)]
pub struct TimestampExtractor {
    config: EngineConfig,
}

impl TimestampExtractor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Sample the first non-empty lines of `path` and score every pattern
    /// against them. The pattern matching the most lines wins; ties break
    /// to the lower library index. Deterministic for unchanged content.
    pub fn detect_best_pattern(
        &self,
        path: &Path,
    ) -> Result<PatternDetectionResult, EngineError> {
        let file = File::open(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        // Raw byte lines with lossy decoding: sampled files are arbitrary
        // content (that is the point of content classification), so
        // invalid UTF-8 must score as "no match", not fail the read.
        let mut sample = Vec::with_capacity(self.config.detection_sample_lines);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| EngineError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            sample.push(line.to_string());
            if sample.len() >= self.config.detection_sample_lines {
                break;
            }
        }

        if sample.is_empty() {
            return Ok(PatternDetectionResult::none(0));
        }

        let library = pattern_library();
        let mut counts = vec![0usize; library.len()];
        let mut first_parsed: Vec<Option<DateTime<Utc>>> = vec![None; library.len()];
        for line in &sample {
            for (i, pattern) in library.iter().enumerate() {
                if pattern.is_match(line) {
                    counts[i] += 1;
                    if first_parsed[i].is_none() {
                        first_parsed[i] = pattern.parse(line);
                    }
                }
            }
        }

        // Strict > keeps the earliest (highest-priority) pattern on ties.
        let mut best_index = None;
        let mut best_count = 0usize;
        for (i, &count) in counts.iter().enumerate() {
            if count > best_count {
                best_count = count;
                best_index = Some(i);
            }
        }

        let Some(index) = best_index else {
            return Ok(PatternDetectionResult::none(sample.len()));
        };

        let winner = &library[index];
        debug!(
            path = %path.display(),
            pattern = winner.name,
            matched = best_count,
            sampled = sample.len(),
            "detected timestamp pattern"
        );

        Ok(PatternDetectionResult {
            pattern: Some(winner),
            sample_timestamp: first_parsed[index],
            lines_sampled: sample.len(),
            match_count: best_count,
            confidence: best_count as f64 / sample.len() as f64,
        })
    }

    /// Parse a timestamp from `line` with the hybrid policy: try the
    /// detected best pattern first, then fall back to the full library in
    /// priority order. Handles mixed-format files at the cost of a wider
    /// scan on off-format lines.
    pub fn parse_timestamp(
        &self,
        line: &str,
        best: Option<&'static TimestampPattern>,
    ) -> Option<DateTime<Utc>> {
        if let Some(pattern) = best {
            if let Some(ts) = pattern.parse(line) {
                return Some(ts);
            }
        }
        pattern_library().iter().find_map(|p| p.parse(line))
    }

    /// Scan lines for the first one carrying a parseable timestamp, up to
    /// `max_lines`. Returns the timestamp, the zero-based line index, and
    /// the (trimmed) line itself. Invalid UTF-8 is decoded lossily so a
    /// stray byte never aborts the scan.
    pub fn find_line_with_timestamp<R: BufRead>(
        &self,
        mut reader: R,
        best: Option<&'static TimestampPattern>,
        max_lines: usize,
    ) -> Result<Option<(DateTime<Utc>, usize, String)>, std::io::Error> {
        let mut buf = Vec::new();
        for index in 0..max_lines {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if let Some(ts) = self.parse_timestamp(line, best) {
                return Ok(Some((ts, index, line.to_string())));
            }
        }
        Ok(None)
    }

    /// Content-based log classification: a file is a log when enough of
    /// its sampled lines carry a recognizable timestamp. Extension and
    /// file name play no part.
    pub fn is_log_file(&self, path: &Path) -> Result<bool, EngineError> {
        let detection = self.detect_best_pattern(path)?;
        Ok(detection.match_count >= self.config.min_match_count
            && detection.confidence >= self.config.min_confidence)
    }
}
