//! Rendering helpers for the per-object log lines.
use std::fmt::Display;

use chrono::{Local, SecondsFormat, TimeZone};

use crate::staleness::ObjectTimestamp;

pub const UNKNOWN: &str = "unknown";

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size using 1024-based units, e.g. `1.5 KB`.
pub fn format_size(num_bytes: Option<u64>) -> String {
    let Some(num_bytes) = num_bytes else {
        return UNKNOWN.to_string();
    };

    let mut size = num_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{num_bytes} {}", SIZE_UNITS[0])
    } else {
        format!("{size:.1} {}", SIZE_UNITS[unit])
    }
}

pub fn format_last_modified(last_modified: Option<&ObjectTimestamp>) -> String {
    format_last_modified_in(last_modified, &Local)
}

/// Naive values are printed as-is, zoned ones converted to `tz` first.
pub fn format_last_modified_in<Tz>(last_modified: Option<&ObjectTimestamp>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match last_modified {
        None => UNKNOWN.to_string(),
        Some(ObjectTimestamp::Naive(naive)) => naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Some(ObjectTimestamp::Zoned(zoned)) => zoned
            .with_timezone(tz)
            .to_rfc3339_opts(SecondsFormat::AutoSi, false),
    }
}

pub fn exists_line(uri: &str, size: &str, last_modified: &str, etag: Option<&str>) -> String {
    format!(
        "Exist: {uri} ; size={size} ; {last_modified} ; etag={}",
        etag.unwrap_or(UNKNOWN)
    )
}

pub fn missing_line(uri: &str) -> String {
    format!("Do NOT exist: {uri} !")
}

pub fn start_line(verb: &str, total: usize) -> String {
    format!("START {verb} of {total} files...")
}

pub fn end_line(verb: &str, total: usize) -> String {
    format!("END {verb} of {total} files!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(Some(0)), "0 B");
        assert_eq!(format_size(Some(1023)), "1023 B");
        assert_eq!(format_size(Some(1024)), "1.0 KB");
        assert_eq!(format_size(Some(1536)), "1.5 KB");
        assert_eq!(format_size(Some(5 * 1024 * 1024 + 300 * 1024)), "5.3 MB");
        assert_eq!(format_size(Some(1073741824)), "1.0 GB");
        assert_eq!(format_size(None), "unknown");
    }

    #[test]
    fn test_format_size_caps_at_terabytes() {
        assert_eq!(format_size(Some(1024u64.pow(4))), "1.0 TB");
        assert_eq!(format_size(Some(2048 * 1024u64.pow(4))), "2048.0 TB");
    }

    #[test]
    fn test_format_last_modified() {
        assert_eq!(format_last_modified(None), "unknown");

        let naive = NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            format_last_modified(Some(&ObjectTimestamp::Naive(naive))),
            "2025-12-31T23:59:59"
        );

        let zoned: ObjectTimestamp = Utc.with_ymd_and_hms(2025, 12, 31, 23, 30, 0).unwrap().into();
        let paris = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            format_last_modified_in(Some(&zoned), &paris),
            "2026-01-01T00:30:00+01:00"
        );
    }

    #[test]
    fn test_log_lines() {
        assert_eq!(
            exists_line(
                "s3://bucket/foo.jpg",
                "1.5 KB",
                "2025-12-31T23:59:59",
                Some("\"abc\"")
            ),
            "Exist: s3://bucket/foo.jpg ; size=1.5 KB ; 2025-12-31T23:59:59 ; etag=\"abc\""
        );
        assert_eq!(
            missing_line("s3://bucket/foo.jpg"),
            "Do NOT exist: s3://bucket/foo.jpg !"
        );
        assert_eq!(start_line("upload", 2), "START upload of 2 files...");
        assert_eq!(end_line("download", 2), "END download of 2 files!");
    }
}
