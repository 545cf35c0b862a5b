//! VolumeAnalyzer — the caller-facing façade over bounds extraction,
//! histogram building, and distribution summaries.

use serde::{Deserialize, Serialize};

use crate::conf::EngineConfig;
use crate::error::EngineError;
use crate::model::{FileEntry, Selection, TimeRange, VolumePoint};
use crate::volume::histogram::HistogramBuilder;

/// Summary statistics over one histogram. Peak and emptiness are judged
/// on the byte-volume estimate, the one signal every counting strategy
/// provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDistribution {
    pub total_size_bytes: u64,
    pub average_per_bin: f64,
    /// Index of the largest bin, `None` for an all-empty histogram.
    pub peak_bin: Option<usize>,
    pub empty_bins: usize,
    /// Largest per-bin file count, a lower bound on the number of
    /// distinct files involved.
    pub total_files: usize,
    /// The span the histogram covers, when it has any bins.
    pub span: Option<TimeRange>,
}

/// High-level entry point for volume analysis over a working set.
#[derive(Debug, Clone)]
pub struct VolumeAnalyzer {
    histogram: HistogramBuilder,
}

impl VolumeAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            histogram: HistogramBuilder::new(config),
        }
    }

    /// Build a byte-volume histogram over the selected log files.
    /// `bin_count` of zero uses the configured default.
    pub fn generate_histogram(
        &self,
        entries: &[FileEntry],
        selection: &dyn Selection,
        bin_count: usize,
    ) -> Result<Vec<VolumePoint>, EngineError> {
        self.histogram.build(entries, selection, bin_count)
    }

    /// The global time range the selected log files cover.
    pub fn get_time_bounds(
        &self,
        entries: &[FileEntry],
        selection: &dyn Selection,
    ) -> Result<TimeRange, EngineError> {
        let extractor = self.histogram.bounds_extractor();
        let report = extractor.extract_bounds_from_selection(entries, selection);
        extractor
            .find_global_bounds(&report)
            .ok_or(EngineError::NoValidBounds)
    }

    /// Summarize a histogram. Pure over its input; an empty slice yields
    /// the zero distribution.
    pub fn analyze_distribution(&self, points: &[VolumePoint]) -> VolumeDistribution {
        let total_size_bytes: u64 = points.iter().map(|p| p.size_bytes).sum();
        let empty_bins = points.iter().filter(|p| p.is_empty()).count();
        let total_files = points.iter().map(|p| p.file_count).max().unwrap_or(0);

        let peak_bin = if total_size_bytes == 0 {
            None
        } else {
            points
                .iter()
                .enumerate()
                .max_by_key(|(_, p)| p.size_bytes)
                .map(|(i, _)| i)
        };

        let average_per_bin = if points.is_empty() {
            0.0
        } else {
            total_size_bytes as f64 / points.len() as f64
        };

        let span = match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                TimeRange::new(first.bin_start, last.bin_end).ok()
            }
            _ => None,
        };

        VolumeDistribution {
            total_size_bytes,
            average_per_bin,
            peak_bin,
            empty_bins,
            total_files,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::NamedTempFile;

    use crate::model::SelectAll;

    fn analyzer() -> VolumeAnalyzer {
        VolumeAnalyzer::new(EngineConfig::default())
    }

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        file
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn point(start: DateTime<Utc>, end: DateTime<Utc>, size_bytes: u64) -> VolumePoint {
        VolumePoint {
            bin_start: start,
            bin_end: end,
            count: 0,
            size_bytes,
            file_count: usize::from(size_bytes > 0),
        }
    }

    // ── Façade ───────────────────────────────────────────────────

    #[test]
    fn histogram_and_bounds_agree_on_coverage() {
        let file = temp_file(
            "2024-01-01T10:00:00Z a\n\
             2024-01-01T10:30:00Z b\n\
             2024-01-01T11:00:00Z c\n",
        );
        let entries = vec![FileEntry::new(file.path(), true)];
        let an = analyzer();

        let bounds = an.get_time_bounds(&entries, &SelectAll).expect("bounds");
        assert_eq!(bounds.start, at(10, 0));
        assert_eq!(bounds.end, at(11, 0));

        let points = an
            .generate_histogram(&entries, &SelectAll, 4)
            .expect("histogram");
        assert_eq!(points.first().map(|p| p.bin_start), Some(bounds.start));
        assert_eq!(points.last().map(|p| p.bin_end), Some(bounds.end));
    }

    #[test]
    fn bounds_of_empty_selection_is_an_error() {
        let err = analyzer()
            .get_time_bounds(&[], &SelectAll)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoValidBounds));
    }

    // ── Distribution ─────────────────────────────────────────────

    #[test]
    fn distribution_finds_peak_and_empty_bins() {
        let points = vec![
            point(at(10, 0), at(11, 0), 100),
            point(at(11, 0), at(12, 0), 0),
            point(at(12, 0), at(13, 0), 400),
            point(at(13, 0), at(14, 0), 100),
        ];
        let dist = analyzer().analyze_distribution(&points);

        assert_eq!(dist.total_size_bytes, 600);
        assert_eq!(dist.peak_bin, Some(2));
        assert_eq!(dist.empty_bins, 1);
        assert_eq!(dist.total_files, 1);
        assert!((dist.average_per_bin - 150.0).abs() < f64::EPSILON);
        let span = dist.span.expect("span");
        assert_eq!(span.start, at(10, 0));
        assert_eq!(span.end, at(14, 0));
    }

    #[test]
    fn distribution_of_empty_histogram_is_zeroed() {
        let dist = analyzer().analyze_distribution(&[]);
        assert_eq!(dist.total_size_bytes, 0);
        assert_eq!(dist.peak_bin, None);
        assert_eq!(dist.empty_bins, 0);
        assert_eq!(dist.total_files, 0);
        assert_eq!(dist.average_per_bin, 0.0);
        assert!(dist.span.is_none());
    }

    #[test]
    fn all_empty_bins_yield_no_peak() {
        let points = vec![
            point(at(10, 0), at(11, 0), 0),
            point(at(11, 0), at(12, 0), 0),
        ];
        let dist = analyzer().analyze_distribution(&points);
        assert_eq!(dist.peak_bin, None);
        assert_eq!(dist.empty_bins, 2);
    }

    #[test]
    fn peak_ties_break_to_the_later_bin() {
        // max_by_key keeps the last maximum.
        let points = vec![
            point(at(10, 0), at(11, 0), 100),
            point(at(11, 0), at(12, 0), 100),
        ];
        let dist = analyzer().analyze_distribution(&points);
        assert_eq!(dist.peak_bin, Some(1));
    }

    #[test]
    fn end_to_end_distribution_over_real_files() {
        let busy = temp_file(
            "2024-01-01T10:00:00Z one\n\
             2024-01-01T10:01:00Z two\n\
             2024-01-01T10:02:00Z three\n\
             2024-01-01T10:03:00Z four\n",
        );
        let quiet = temp_file(
            "2024-01-01T13:59:00Z five\n\
             2024-01-01T14:00:00Z six\n",
        );
        let entries = vec![
            FileEntry::new(busy.path(), true),
            FileEntry::new(quiet.path(), true),
        ];
        let an = analyzer();

        let points = an
            .generate_histogram(&entries, &SelectAll, 4)
            .expect("histogram");
        let dist = an.analyze_distribution(&points);

        // Busy file dominates the first hour of the 10:00-14:00 range.
        assert_eq!(dist.peak_bin, Some(0));
        assert!(dist.empty_bins >= 1);
        assert_eq!(
            dist.total_size_bytes,
            points.iter().map(|p| p.size_bytes).sum::<u64>()
        );
    }
}
