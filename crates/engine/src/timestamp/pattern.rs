//! The timestamp pattern library: a fixed, priority-ordered list of
//! compiled regex + time-layout pairs, each present in an anchored
//! (line-start) and unanchored variant. Anchored variants are inserted
//! first so they rank higher and win detection ties.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use regex::Regex;

/// Whether a pattern only matches at the start of a line.
/// Most logs lead with their timestamp, so anchored variants cover the
/// common case cheaply and take priority over the unanchored copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchoring {
    LineStart,
    Anywhere,
}

/// How the matched text is turned into an instant.
#[derive(Debug, Clone, Copy)]
pub enum TimeLayout {
    /// Formats tried in order, interpreted as UTC. `%.f` absorbs the
    /// varying fractional-second widths producers emit for the same
    /// nominal format.
    Naive(&'static [&'static str]),
    /// Formats carrying an explicit UTC offset (`%z`).
    Offset(&'static [&'static str]),
    /// Month-day formats without a year (syslog); the current calendar
    /// year is injected before parsing.
    YearlessNaive(&'static [&'static str]),
    /// Glog digit runs (`I0102 15:04:05.000000` / `I20060102 ...`).
    /// Parsed by slicing the date run: chrono's flexible-width `%Y`
    /// over-consumes an adjacent 8-digit run.
    Glog { with_year: bool },
    /// Epoch integer whose precision follows from its digit count
    /// (10 = seconds, 13 = millis, 16 = micros, 19 = nanos).
    Unix,
}

#[derive(Debug)]
pub struct TimestampPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub layout: TimeLayout,
    pub anchoring: Anchoring,
    /// Lower number = higher priority.
    pub priority: usize,
}

impl TimestampPattern {
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Match this pattern against a line and parse the captured timestamp.
    /// Patterns with an explicit capture group (glog, audit) parse group 1;
    /// everything else parses the whole match.
    pub fn parse(&self, line: &str) -> Option<DateTime<Utc>> {
        let caps = self.regex.captures(line)?;
        let matched = caps.get(1).or_else(|| caps.get(0))?;
        self.layout.parse(matched.as_str())
    }
}

impl TimeLayout {
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            TimeLayout::Naive(formats) => {
                let text = normalize_whitespace(raw);
                parse_naive(&text, formats)
            }
            TimeLayout::Offset(formats) => {
                let text = normalize_whitespace(raw);
                formats
                    .iter()
                    .find_map(|fmt| DateTime::parse_from_str(&text, fmt).ok())
                    .map(|dt| dt.with_timezone(&Utc))
            }
            TimeLayout::YearlessNaive(formats) => {
                let text = format!("{} {}", Utc::now().year(), normalize_whitespace(raw));
                parse_naive(&text, formats)
            }
            TimeLayout::Glog { with_year } => parse_glog(raw, *with_year),
            TimeLayout::Unix => parse_epoch(raw),
        }
    }
}

fn parse_naive(text: &str, formats: &[&str]) -> Option<DateTime<Utc>> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Collapse whitespace runs so formats can use single literal spaces
/// (patterns admit `\s+` and syslog pads single-digit days).
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a glog digit run: `MMDD HH:MM:SS.ffffff` (year injected) or
/// `YYYYMMDD HH:MM:SS.ffffff`.
fn parse_glog(raw: &str, with_year: bool) -> Option<DateTime<Utc>> {
    let text = normalize_whitespace(raw.trim_end_matches('Z'));
    let (date_part, time_part) = text.split_once(' ')?;

    let (year, month, day) = if with_year {
        if date_part.len() != 8 {
            return None;
        }
        (
            date_part[0..4].to_string(),
            &date_part[4..6],
            &date_part[6..8],
        )
    } else {
        if date_part.len() != 4 {
            return None;
        }
        (
            Utc::now().year().to_string(),
            &date_part[0..2],
            &date_part[2..4],
        )
    };

    let assembled = format!("{year}-{month}-{day} {time_part}");
    parse_naive(&assembled, &["%Y-%m-%d %H:%M:%S%.f"])
}

/// Decode an epoch integer, inferring precision from the digit count.
fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let value: i64 = raw.parse().ok()?;
    match raw.len() {
        10 => DateTime::from_timestamp(value, 0),
        13 => DateTime::from_timestamp(value / 1_000, ((value % 1_000) * 1_000_000) as u32),
        16 => DateTime::from_timestamp(value / 1_000_000, ((value % 1_000_000) * 1_000) as u32),
        19 => DateTime::from_timestamp(value / 1_000_000_000, (value % 1_000_000_000) as u32),
        _ => None,
    }
}

/// The logical formats, most specific first. Order matters: detection
/// ties break to the lowest index.
const LOGICAL_FORMATS: &[(&str, &str, TimeLayout)] = &[
    (
        "Iso8601Micro",
        r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z?",
        TimeLayout::Naive(&["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S%.f"]),
    ),
    (
        "Iso8601",
        r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z?",
        TimeLayout::Naive(&["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"]),
    ),
    (
        "SlashDateTime",
        r"\d{4}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2}",
        TimeLayout::Naive(&["%Y/%m/%d %H:%M:%S"]),
    ),
    (
        "DashDateTime",
        r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}",
        TimeLayout::Naive(&["%Y-%m-%d %H:%M:%S"]),
    ),
    (
        "DashDateTimeMicro",
        r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\.\d+",
        TimeLayout::Naive(&["%Y-%m-%d %H:%M:%S%.f"]),
    ),
    (
        "DashDateTimeMilli",
        r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2},\d{3}Z?",
        TimeLayout::Naive(&["%Y-%m-%d %H:%M:%S,%3fZ", "%Y-%m-%d %H:%M:%S,%3f"]),
    ),
    (
        "GlogShort",
        r"[IWEF](\d{4}\s+\d{2}:\d{2}:\d{2}\.\d+Z?)",
        TimeLayout::Glog { with_year: false },
    ),
    (
        "GlogLong",
        r"[IWEF](\d{8}\s+\d{2}:\d{2}:\d{2}\.\d+Z?)",
        TimeLayout::Glog { with_year: true },
    ),
    (
        "Syslog",
        r"\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}",
        TimeLayout::YearlessNaive(&["%Y %b %d %H:%M:%S"]),
    ),
    (
        "Apache",
        r"\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+\+\d{4}",
        TimeLayout::Offset(&["%d/%b/%Y:%H:%M:%S %z"]),
    ),
    (
        "Audit",
        r"msg=audit\((\d{10,19}):\d+\)",
        TimeLayout::Unix,
    ),
];

fn build_library() -> Vec<TimestampPattern> {
    let mut patterns = Vec::with_capacity(LOGICAL_FORMATS.len() * 2);

    // Anchored variants first: they match the common timestamp-leads-the-line
    // shape and take detection priority.
    for (i, (name, source, layout)) in LOGICAL_FORMATS.iter().enumerate() {
        patterns.push(TimestampPattern {
            name,
            regex: Regex::new(&format!("^{source}")).expect("built-in pattern must compile"),
            layout: *layout,
            anchoring: Anchoring::LineStart,
            priority: i,
        });
    }

    for (i, (name, source, layout)) in LOGICAL_FORMATS.iter().enumerate() {
        patterns.push(TimestampPattern {
            name,
            regex: Regex::new(source).expect("built-in pattern must compile"),
            layout: *layout,
            anchoring: Anchoring::Anywhere,
            priority: i + LOGICAL_FORMATS.len(),
        });
    }

    patterns
}

/// The shared pattern library, compiled once and read-only afterwards.
pub fn pattern_library() -> &'static [TimestampPattern] {
    static LIBRARY: OnceLock<Vec<TimestampPattern>> = OnceLock::new();
    LIBRARY.get_or_init(build_library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn parse_with(name: &str, anchoring: Anchoring, line: &str) -> Option<DateTime<Utc>> {
        pattern_library()
            .iter()
            .find(|p| p.name == name && p.anchoring == anchoring)
            .expect("pattern exists")
            .parse(line)
    }

    // ── Library shape ────────────────────────────────────────────

    #[test]
    fn library_doubles_each_logical_format() {
        let library = pattern_library();
        assert_eq!(library.len(), LOGICAL_FORMATS.len() * 2);

        let anchored = library
            .iter()
            .filter(|p| p.anchoring == Anchoring::LineStart)
            .count();
        assert_eq!(anchored, LOGICAL_FORMATS.len());
    }

    #[test]
    fn priorities_are_unique_and_ascending() {
        let library = pattern_library();
        for (i, pattern) in library.iter().enumerate() {
            assert_eq!(pattern.priority, i);
        }
    }

    #[test]
    fn anchored_variant_outranks_unanchored_twin() {
        let library = pattern_library();
        for name in ["Iso8601Micro", "Syslog", "Audit"] {
            let anchored = library
                .iter()
                .find(|p| p.name == name && p.anchoring == Anchoring::LineStart)
                .expect("anchored variant");
            let unanchored = library
                .iter()
                .find(|p| p.name == name && p.anchoring == Anchoring::Anywhere)
                .expect("unanchored variant");
            assert!(anchored.priority < unanchored.priority);
        }
    }

    #[test]
    fn anchored_pattern_rejects_mid_line_timestamp() {
        let library = pattern_library();
        let anchored = &library[0];
        assert_eq!(anchored.anchoring, Anchoring::LineStart);
        assert!(anchored.is_match("2024-01-01T00:00:00Z start"));
        assert!(!anchored.is_match("prefix 2024-01-01T00:00:00Z"));
    }

    // ── ISO 8601 ─────────────────────────────────────────────────

    #[test]
    fn parses_iso8601_with_and_without_fraction() {
        let plain = parse_with("Iso8601Micro", Anchoring::LineStart, "2024-01-01T12:30:45Z x")
            .expect("plain");
        let micros = parse_with(
            "Iso8601Micro",
            Anchoring::LineStart,
            "2024-01-01T12:30:45.123456Z x",
        )
        .expect("micros");
        let millis = parse_with(
            "Iso8601Micro",
            Anchoring::LineStart,
            "2024-01-01T12:30:45.123 x",
        )
        .expect("millis");

        assert_eq!(plain, Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 45).unwrap());
        assert_eq!(micros.timestamp_subsec_micros(), 123_456);
        assert_eq!(millis.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn parses_dash_datetime_with_comma_millis() {
        let ts = parse_with(
            "DashDateTimeMilli",
            Anchoring::LineStart,
            "2024-03-05 08:00:01,250 INFO starting",
        )
        .expect("comma millis");
        assert_eq!(ts.timestamp_subsec_millis(), 250);
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn parses_slash_datetime() {
        let ts = parse_with(
            "SlashDateTime",
            Anchoring::LineStart,
            "2024/02/29 23:59:59 leap",
        )
        .expect("slash datetime");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
    }

    // ── Glog ─────────────────────────────────────────────────────

    #[test]
    fn parses_glog_short_with_injected_year() {
        let ts = parse_with(
            "GlogShort",
            Anchoring::LineStart,
            "I0102 15:04:05.123456 worker.cc:42] msg",
        )
        .expect("glog short");
        assert_eq!(ts.year(), Utc::now().year());
        assert_eq!((ts.month(), ts.day()), (1, 2));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (15, 4, 5));
        assert_eq!(ts.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn parses_glog_long_with_embedded_year() {
        let ts = parse_with(
            "GlogLong",
            Anchoring::LineStart,
            "W20240102 15:04:05.500 main.cc:1] warn",
        )
        .expect("glog long");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 1, 2));
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    // ── Syslog ───────────────────────────────────────────────────

    #[test]
    fn syslog_injects_current_year() {
        let ts = parse_with(
            "Syslog",
            Anchoring::LineStart,
            "Jan  2 15:04:05 myhost sshd[123]: accepted",
        )
        .expect("syslog");
        assert_eq!(ts.year(), Utc::now().year());
        assert_eq!((ts.month(), ts.day()), (1, 2));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (15, 4, 5));
    }

    // ── Apache ───────────────────────────────────────────────────

    #[test]
    fn apache_offset_converts_to_utc() {
        let ts = parse_with(
            "Apache",
            Anchoring::Anywhere,
            "127.0.0.1 - - [10/Oct/2000:13:55:36 +0700] \"GET / HTTP/1.0\" 200 2326",
        )
        .expect("apache");
        assert_eq!(ts, Utc.with_ymd_and_hms(2000, 10, 10, 6, 55, 36).unwrap());
    }

    // ── Unix epoch ───────────────────────────────────────────────

    #[test]
    fn epoch_seconds_and_millis_decode_to_same_instant() {
        let secs = parse_epoch("1700000000").expect("seconds");
        let millis = parse_epoch("1700000000000").expect("millis");
        assert_eq!(secs, millis);
        assert_eq!(secs.timestamp(), 1_700_000_000);
    }

    #[test]
    fn epoch_precision_follows_digit_count() {
        let millis = parse_epoch("1700000000123").expect("millis");
        assert_eq!(millis.timestamp_subsec_millis(), 123);

        let micros = parse_epoch("1700000000123456").expect("micros");
        assert_eq!(micros.timestamp_subsec_micros(), 123_456);

        let nanos = parse_epoch("1700000000123456789").expect("nanos");
        assert_eq!(nanos.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn epoch_rejects_odd_digit_counts() {
        assert!(parse_epoch("170000000").is_none()); // 9 digits
        assert!(parse_epoch("17000000001").is_none()); // 11 digits
    }

    #[test]
    fn audit_line_decodes_epoch_capture() {
        let ts = parse_with(
            "Audit",
            Anchoring::Anywhere,
            "type=SYSCALL msg=audit(1700000000:1234): arch=c000003e",
        )
        .expect("audit");
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    // ── Non-matches ──────────────────────────────────────────────

    #[test]
    fn plain_text_matches_nothing() {
        let library = pattern_library();
        let line = "just a plain message with no time in it";
        assert!(library.iter().all(|p| p.parse(line).is_none()));
    }
}
