use std::fmt::{self, Display};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use crate::error::MediaError;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
pub const RUNS_DIR: &str = "runs";
pub const LOGS_DIR: &str = "logs";

/// One invocation of a tool. The timestamp is chosen once and names both the
/// download directory and the log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    timestamp: String,
}

impl Run {
    pub fn start() -> Self {
        Self::at(Local::now())
    }

    pub fn at<Tz: TimeZone>(moment: DateTime<Tz>) -> Self
    where
        Tz::Offset: Display,
    {
        Self {
            timestamp: moment.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn run_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(RUNS_DIR).join(&self.timestamp)
    }

    pub fn log_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(LOGS_DIR).join(&self.timestamp)
    }

    pub fn log_file(&self, data_dir: &Path, tool: &str) -> PathBuf {
        self.log_dir(data_dir).join(format!("{tool}.log"))
    }
}

/// The most recent non-empty run directory under `data_dir`, if any.
/// Timestamps sort lexicographically in chronological order.
pub fn latest_run_dir(data_dir: &Path) -> Result<Option<PathBuf>, MediaError> {
    let runs = data_dir.join(RUNS_DIR);
    let entries = match fs::read_dir(&runs) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(MediaError::io(
                format!("Failed to list {}", runs.display()),
                e,
            ))
        }
    };

    let mut latest: Option<(OsString, PathBuf)> = None;
    for entry in entries {
        let entry =
            entry.map_err(|e| MediaError::io(format!("Failed to list {}", runs.display()), e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if latest.as_ref().is_some_and(|(best, _)| name <= *best) {
            continue;
        }
        // A run that failed before downloading anything leaves an empty dir
        if is_empty_dir(&path)? {
            continue;
        }
        latest = Some((name, path));
    }
    Ok(latest.map(|(_, path)| path))
}

fn is_empty_dir(path: &Path) -> Result<bool, MediaError> {
    let mut entries = fs::read_dir(path)
        .map_err(|e| MediaError::io(format!("Failed to list {}", path.display()), e))?;
    Ok(entries.next().is_none())
}

/// Outcome counts of a run. Every identifier lands in exactly one bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub missing: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.missing + self.skipped + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed: {} succeeded, {} missing, {} skipped, {} failed",
            self.processed(),
            self.total,
            self.succeeded,
            self.missing,
            self.skipped,
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_run_layout() {
        let run = Run::at(Utc.with_ymd_and_hms(2026, 2, 23, 5, 43, 44).unwrap());
        assert_eq!(run.timestamp(), "20260223-054344");

        let data = Path::new("data");
        assert_eq!(run.run_dir(data), Path::new("data/runs/20260223-054344"));
        assert_eq!(
            run.log_file(data, "upload"),
            Path::new("data/logs/20260223-054344/upload.log")
        );
    }

    #[test]
    fn test_latest_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_run_dir(dir.path()).unwrap(), None);

        let runs = dir.path().join(RUNS_DIR);
        for ts in ["20260101-000000", "20260223-054344", "20260130-120000"] {
            fs::create_dir_all(runs.join(ts)).unwrap();
            fs::write(runs.join(ts).join("foo.jpg"), b"jpeg").unwrap();
        }
        fs::write(runs.join("99999999-999999"), b"not a directory").unwrap();

        assert_eq!(
            latest_run_dir(dir.path()).unwrap(),
            Some(runs.join("20260223-054344"))
        );
    }

    #[test]
    fn test_latest_run_dir_skips_empty_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runs = dir.path().join(RUNS_DIR);

        fs::create_dir_all(runs.join("20260101-000000/bar")).unwrap();
        fs::write(runs.join("20260101-000000/bar/baz.jpg"), b"jpeg").unwrap();
        fs::create_dir_all(runs.join("20260223-054344")).unwrap();

        assert_eq!(
            latest_run_dir(dir.path()).unwrap(),
            Some(runs.join("20260101-000000"))
        );

        fs::remove_dir_all(runs.join("20260101-000000")).unwrap();
        assert_eq!(latest_run_dir(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new(5);
        summary.succeeded = 2;
        summary.missing = 1;
        summary.skipped = 1;
        assert_eq!(summary.processed(), 4);
        assert!(summary.is_clean());

        summary.failed = 1;
        assert!(!summary.is_clean());
        assert_eq!(
            summary.to_string(),
            "5/5 processed: 2 succeeded, 1 missing, 1 skipped, 1 failed"
        );
    }
}
