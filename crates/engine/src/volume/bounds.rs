//! Per-file time bounds via two short scans: a capped forward read for
//! the earliest timestamp and a fixed-size tail read for the latest.
//! Neither scan reads the file body, so bounds stay cheap on large logs.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::conf::EngineConfig;
use crate::error::EngineError;
use crate::model::{FileEntry, Selection, TimeRange};
use crate::timestamp::{TimestampExtractor, TimestampPattern};

/// Earliest and latest timestamps observed in one file, with the lines
/// that carried them (useful for display and for diagnosing a bad
/// pattern match) and the pattern that won detection, so later counting
/// passes need not re-detect.
#[derive(Debug, Clone)]
pub struct TimeBounds {
    pub path: PathBuf,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
    pub earliest_line: String,
    pub latest_line: String,
    pub best_pattern: Option<&'static TimestampPattern>,
}

/// Bounds for a batch of files, with counters for what the batch had to
/// tolerate. Callers decide what the counters mean for them.
#[derive(Debug, Default)]
pub struct BoundsReport {
    pub bounds: Vec<TimeBounds>,
    /// Files dropped for having no parseable timestamp or failing to read.
    pub skipped: usize,
    /// Files whose tail timestamp preceded their head timestamp.
    pub monotonicity_violations: usize,
}

/// Extracts per-file and global time bounds.
#[derive(Debug, Clone)]
pub struct BoundsExtractor {
    config: EngineConfig,
    extractor: TimestampExtractor,
}

impl BoundsExtractor {
    pub fn new(config: EngineConfig) -> Self {
        let extractor = TimestampExtractor::new(config.clone());
        Self { config, extractor }
    }

    pub fn extractor(&self) -> &TimestampExtractor {
        &self.extractor
    }

    /// Extract bounds for one file. The earliest timestamp comes from a
    /// forward scan capped at `max_bound_scan_lines`; the latest from the
    /// final `tail_read_bytes` of the file. A reversed pair is swapped so
    /// the result always satisfies `earliest <= latest`.
    pub fn extract_bounds(&self, path: &Path) -> Result<TimeBounds, EngineError> {
        self.extract_bounds_inner(path).map(|(bounds, _)| bounds)
    }

    /// Batch bounds over the selected entries. Unselected entries and
    /// entries not classified as logs are ignored; files without a
    /// parseable timestamp are counted as skipped, not errors.
    pub fn extract_bounds_from_selection(
        &self,
        entries: &[FileEntry],
        selection: &dyn Selection,
    ) -> BoundsReport {
        let mut report = BoundsReport::default();
        for entry in entries {
            if !entry.is_log_file || !selection.is_selected(&entry.path) {
                continue;
            }
            match self.extract_bounds_inner(&entry.path) {
                Ok((bounds, swapped)) => {
                    if swapped {
                        report.monotonicity_violations += 1;
                    }
                    report.bounds.push(bounds);
                }
                Err(err) => {
                    warn!(path = %entry.path.display(), error = %err, "skipping file");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// The span covering every file in the report, or `None` when the
    /// report holds no bounds.
    pub fn find_global_bounds(&self, report: &BoundsReport) -> Option<TimeRange> {
        let earliest = report.bounds.iter().map(|b| b.earliest).min()?;
        let latest = report.bounds.iter().map(|b| b.latest).max()?;
        // earliest <= latest holds by construction of each entry
        TimeRange::new(earliest, latest).ok()
    }

    fn extract_bounds_inner(&self, path: &Path) -> Result<(TimeBounds, bool), EngineError> {
        // No detectable pattern means the file does not contribute; the
        // deeper bound scans only refine a detection that succeeded.
        let Some(best) = self.extractor.detect_best_pattern(path)?.pattern else {
            return Err(EngineError::NoTimestamp);
        };
        let best = Some(best);

        let file = File::open(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let (earliest, _, earliest_line) = self
            .extractor
            .find_line_with_timestamp(reader, best, self.config.max_bound_scan_lines)
            .map_err(|source| EngineError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .ok_or(EngineError::NoTimestamp)?;

        let (latest, latest_line) = self
            .latest_from_tail(path, best)?
            .unwrap_or_else(|| (earliest, earliest_line.clone()));

        let swapped = latest < earliest;
        if swapped {
            warn!(
                path = %path.display(),
                head = %earliest,
                tail = %latest,
                "timestamps not monotonic, swapping bounds"
            );
        }
        let (earliest, earliest_line, latest, latest_line) = if swapped {
            (latest, latest_line, earliest, earliest_line)
        } else {
            (earliest, earliest_line, latest, latest_line)
        };
        let bounds = TimeBounds {
            path: path.to_path_buf(),
            earliest,
            latest,
            earliest_line,
            latest_line,
            best_pattern: best,
        };
        Ok((bounds, swapped))
    }

    /// Read the last `tail_read_bytes` of the file and return the last
    /// parseable timestamp in it, with its line. The first line of the
    /// chunk is dropped when the chunk starts mid-file, since it may be
    /// a partial line.
    fn latest_from_tail(
        &self,
        path: &Path,
        best: Option<&'static TimestampPattern>,
    ) -> Result<Option<(DateTime<Utc>, String)>, EngineError> {
        let io_err = |source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        let tail = self.config.tail_read_bytes;
        let offset = len.saturating_sub(tail);
        file.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let mut chunk = Vec::with_capacity(len.min(tail) as usize);
        file.read_to_end(&mut chunk).map_err(io_err)?;
        let text = String::from_utf8_lossy(&chunk);

        let mut lines = text.lines();
        if offset > 0 {
            // Possibly a partial line; discard it.
            lines.next();
        }

        let mut latest = None;
        for line in lines {
            if let Some(ts) = self.extractor.parse_timestamp(line, best) {
                latest = Some((ts, line.to_string()));
            }
        }
        Ok(latest)
    }
}
