//! Histogram construction: per-file bounds, a shared bin grid over the
//! global range, and parallel per-file byte counting merged into one
//! series of volume points.

use chrono::Duration;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::conf::EngineConfig;
use crate::error::EngineError;
use crate::model::{FileEntry, Selection, TimeRange, VolumePoint};
use crate::volume::bounds::{BoundsExtractor, TimeBounds};
use crate::volume::search::open_counter;

/// Builds time-binned byte-volume histograms over a set of files.
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    config: EngineConfig,
    bounds: BoundsExtractor,
}

impl HistogramBuilder {
    pub fn new(config: EngineConfig) -> Self {
        let bounds = BoundsExtractor::new(config.clone());
        Self { config, bounds }
    }

    pub fn bounds_extractor(&self) -> &BoundsExtractor {
        &self.bounds
    }

    /// Build a histogram with `bin_count` bins (zero means the configured
    /// default) across the selected log files. Files contribute to every
    /// bin their own bounds overlap; files with no parseable timestamps
    /// are skipped, and the whole build fails only when no file yields
    /// bounds at all.
    pub fn build(
        &self,
        entries: &[FileEntry],
        selection: &dyn Selection,
        bin_count: usize,
    ) -> Result<Vec<VolumePoint>, EngineError> {
        let report = self.bounds.extract_bounds_from_selection(entries, selection);
        if report.skipped > 0 || report.monotonicity_violations > 0 {
            warn!(
                skipped = report.skipped,
                monotonicity_violations = report.monotonicity_violations,
                "bounds extraction was partial"
            );
        }
        let range = self
            .bounds
            .find_global_bounds(&report)
            .ok_or(EngineError::NoValidBounds)?;

        let bin_count = if bin_count == 0 {
            self.config.default_bin_count
        } else {
            bin_count
        };
        let bins = create_time_bins(range, bin_count);
        debug!(
            files = report.bounds.len(),
            bins = bins.len(),
            range = %range,
            "building histogram"
        );

        // Each worker counts one file across all bins, so the expensive
        // per-file setup (detection, mmap) happens exactly once per file.
        let contributions: Vec<Vec<(usize, u64)>> = report
            .bounds
            .par_iter()
            .map(|file_bounds| self.file_contributions(file_bounds, &bins))
            .collect();

        // Summed in file order, so the result is deterministic regardless
        // of worker scheduling.
        let mut points: Vec<VolumePoint> = bins
            .iter()
            .map(|bin| VolumePoint::empty(bin.start, bin.end))
            .collect();
        for file_contribution in contributions {
            for (index, bytes) in file_contribution {
                points[index].size_bytes += bytes;
                points[index].file_count += 1;
            }
        }
        Ok(points)
    }

    /// Count one file's bytes per bin. Bins outside the file's own bounds
    /// are skipped without touching the file; a file whose counter cannot
    /// be opened contributes nothing.
    fn file_contributions(&self, file_bounds: &TimeBounds, bins: &[TimeRange]) -> Vec<(usize, u64)> {
        let counter = match open_counter(
            self.bounds.extractor(),
            &file_bounds.path,
            file_bounds.best_pattern,
        ) {
            Ok(counter) => counter,
            Err(err) => {
                warn!(path = %file_bounds.path.display(), error = %err, "cannot count file");
                return Vec::new();
            }
        };

        let mut contributions = Vec::new();
        for (index, bin) in bins.iter().enumerate() {
            if file_bounds.latest < bin.start || file_bounds.earliest > bin.end {
                continue;
            }
            match counter.bytes_in_range(bin) {
                Ok(0) => {}
                Ok(bytes) => contributions.push((index, bytes)),
                Err(err) => {
                    warn!(
                        path = %file_bounds.path.display(),
                        error = %err,
                        "count failed for bin"
                    );
                }
            }
        }
        contributions
    }
}

/// Split `range` into `bin_count` contiguous equal-duration bins. The
/// last bin's end is pinned to the range end so integer division of the
/// duration never leaves a gap. A zero-duration range yields one bin.
pub fn create_time_bins(range: TimeRange, bin_count: usize) -> Vec<TimeRange> {
    if bin_count == 0 || range.duration() == Duration::zero() {
        return vec![range];
    }

    let bin_duration = range.duration() / bin_count as i32;
    let mut bins = Vec::with_capacity(bin_count);
    let mut current = range.start;
    for i in 0..bin_count {
        let end = if i == bin_count - 1 {
            range.end
        } else {
            current + bin_duration
        };
        bins.push(TimeRange { start: current, end });
        current = end;
    }
    bins
}
