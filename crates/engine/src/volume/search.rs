//! Byte-volume estimation inside a time range.
//!
//! `MmapSearcher` memory-maps a file and binary-searches byte offsets by
//! timestamp, so cost scales with the log of the file size. Files that
//! cannot be mapped fall back to `LinearScanner`, a single forward pass.
//! Both report the bytes between the first line at-or-after the range
//! start and the first line past the range end.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use memmap2::Mmap;
use tracing::debug;

use crate::error::EngineError;
use crate::model::TimeRange;
use crate::timestamp::{TimestampExtractor, TimestampPattern};

/// Which edge of a time range a byte-offset search resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBound {
    /// First line with a timestamp `>=` the target.
    Start,
    /// First line with a timestamp `>` the target.
    End,
}

/// Estimates the bytes a file contributes to a time range. Implementations
/// are opened once per file and queried once per bin.
pub trait ByteRangeCounter {
    fn bytes_in_range(&self, range: &TimeRange) -> Result<u64, EngineError>;
}

/// Open the best available counter for `path`: memory-mapped when the
/// file supports it, linear scan otherwise. The choice is made once here
/// so per-bin queries never re-probe the file. `best` is the pattern
/// detection already found for the file (bounds extraction carries it).
pub fn open_counter(
    extractor: &TimestampExtractor,
    path: &Path,
    best: Option<&'static TimestampPattern>,
) -> Result<Box<dyn ByteRangeCounter>, EngineError> {
    match MmapSearcher::open(extractor, path, best) {
        Ok(searcher) => Ok(Box::new(searcher)),
        Err(EngineError::UnsupportedSource { reason, .. }) => {
            debug!(path = %path.display(), reason, "falling back to linear scan");
            Ok(Box::new(LinearScanner::open(extractor, path, best)))
        }
        Err(err) => Err(err),
    }
}

/// Binary search over a memory-mapped file. The map is read-only and is
/// unmapped when the searcher is dropped.
#[derive(Debug)]
pub struct MmapSearcher {
    mmap: Mmap,
    extractor: TimestampExtractor,
    best: Option<&'static TimestampPattern>,
}

impl MmapSearcher {
    /// Map `path` read-only. Refuses non-regular and empty files, and
    /// surfaces map failures, as `UnsupportedSource` so callers can fall
    /// back instead of failing the file.
    pub fn open(
        extractor: &TimestampExtractor,
        path: &Path,
        best: Option<&'static TimestampPattern>,
    ) -> Result<Self, EngineError> {
        let unsupported = |reason: String| EngineError::UnsupportedSource {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = file.metadata().map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(unsupported("not a regular file".to_string()));
        }
        if meta.len() == 0 {
            return Err(unsupported("file is empty".to_string()));
        }

        // Safety: the map is read-only and private to this process. A
        // concurrent truncation of the underlying file would still fault,
        // which is the accepted trade-off of mmap on live logs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|err| unsupported(err.to_string()))?;

        Ok(Self {
            mmap,
            extractor: extractor.clone(),
            best,
        })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn find_line_start(&self, offset: usize) -> usize {
        let offset = offset.min(self.mmap.len());
        match self.mmap[..offset].iter().rposition(|&b| b == b'\n') {
            Some(newline) => newline + 1,
            None => 0,
        }
    }

    /// Offset of the newline ending the line that starts at or contains
    /// `offset`, or the end of the map for an unterminated final line.
    pub fn find_line_end(&self, offset: usize) -> usize {
        let offset = offset.min(self.mmap.len());
        match self.mmap[offset..].iter().position(|&b| b == b'\n') {
            Some(newline) => offset + newline,
            None => self.mmap.len(),
        }
    }

    fn parse_line_at(&self, line_start: usize) -> Option<DateTime<Utc>> {
        let line_end = self.find_line_end(line_start);
        let line = String::from_utf8_lossy(&self.mmap[line_start..line_end]);
        self.extractor.parse_timestamp(&line, self.best)
    }

    /// Scan forward from the line at `from` until a parseable line is
    /// found, without crossing `limit`. Returns the line's start offset
    /// and timestamp.
    fn find_next_parseable(&self, from: usize, limit: usize) -> Option<(usize, DateTime<Utc>)> {
        let mut line_start = from;
        while line_start < limit {
            if let Some(ts) = self.parse_line_at(line_start) {
                return Some((line_start, ts));
            }
            line_start = self.find_line_end(line_start) + 1;
        }
        None
    }

    /// Binary-search the byte offset of the range edge described by
    /// `bound`. Returns the map length when every line precedes the
    /// target. Unparseable probe lines are skipped forward; when nothing
    /// between the probe and the current right edge parses, the search
    /// narrows left.
    pub fn binary_search_time(&self, target: DateTime<Utc>, bound: SearchBound) -> usize {
        let mut left = 0usize;
        let mut right = self.mmap.len();
        let mut result = right;

        while left < right {
            let mid = left + (right - left) / 2;
            let line_start = self.find_line_start(mid);

            let Some((probe_start, ts)) = self.find_next_parseable(line_start, right) else {
                right = mid;
                continue;
            };

            let past_target = match bound {
                SearchBound::Start => ts >= target,
                SearchBound::End => ts > target,
            };
            if past_target {
                result = probe_start;
                right = mid;
            } else {
                left = self.find_line_end(probe_start) + 1;
            }
        }
        result
    }
}

impl ByteRangeCounter for MmapSearcher {
    fn bytes_in_range(&self, range: &TimeRange) -> Result<u64, EngineError> {
        let start = self.binary_search_time(range.start, SearchBound::Start);
        let end = self.binary_search_time(range.end, SearchBound::End);
        if end <= start {
            return Ok(0);
        }
        Ok((end - start) as u64)
    }
}

/// Fallback counter: one buffered forward pass per query. Continuation
/// lines without a timestamp are attributed to the last timestamped line.
#[derive(Debug)]
pub struct LinearScanner {
    path: PathBuf,
    extractor: TimestampExtractor,
    best: Option<&'static TimestampPattern>,
}

impl LinearScanner {
    pub fn open(
        extractor: &TimestampExtractor,
        path: &Path,
        best: Option<&'static TimestampPattern>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            extractor: extractor.clone(),
            best,
        }
    }
}

impl ByteRangeCounter for LinearScanner {
    fn bytes_in_range(&self, range: &TimeRange) -> Result<u64, EngineError> {
        let file = File::open(&self.path).map_err(|source| EngineError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut total = 0u64;
        let mut in_range = false;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| EngineError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            // Terminating newline counts toward the line's bytes; lossy
            // decoding tolerates stray invalid bytes mid-file.
            let line_bytes = read as u64;
            let line = String::from_utf8_lossy(&buf);

            match self.extractor.parse_timestamp(line.trim_end(), self.best) {
                Some(ts) if range.contains(ts) => {
                    in_range = true;
                    total += line_bytes;
                }
                Some(ts) if ts > range.end => break,
                Some(_) => in_range = false,
                None if in_range => total += line_bytes,
                None => {}
            }
        }
        Ok(total)
    }
}
