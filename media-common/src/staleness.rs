//! Decides whether a remote object predates the replacement cutoff.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::MediaError;

pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

/// A last-modified value as reported by the store, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTimestamp {
    /// No timezone information; taken to be local time already.
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl ObjectTimestamp {
    /// Wall-clock time of this timestamp in `tz`.
    pub fn local_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            ObjectTimestamp::Naive(naive) => *naive,
            ObjectTimestamp::Zoned(zoned) => zoned.with_timezone(tz).naive_local(),
        }
    }
}

impl From<DateTime<Utc>> for ObjectTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        ObjectTimestamp::Zoned(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for ObjectTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        ObjectTimestamp::Zoned(value)
    }
}

impl From<NaiveDateTime> for ObjectTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        ObjectTimestamp::Naive(value)
    }
}

/// Calendar date (no time of day) before which objects are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffDate(pub NaiveDate);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCutoffDateError(pub String);

impl fmt::Display for ParseCutoffDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid YYYY-MM-DD date", self.0)
    }
}

impl FromStr for CutoffDate {
    type Err = ParseCutoffDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), CUTOFF_DATE_FORMAT)
            .map(CutoffDate)
            .map_err(|_| ParseCutoffDateError(s.to_owned()))
    }
}

impl fmt::Display for CutoffDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CUTOFF_DATE_FORMAT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Modified strictly before the cutoff; eligible for backup-and-replace.
    Stale,
    Current,
}

#[derive(Debug, Clone)]
pub struct StalenessClassifier<Tz: TimeZone = Local> {
    cutoff: CutoffDate,
    start_of_day: NaiveDateTime,
    tz: Tz,
}

impl StalenessClassifier<Local> {
    pub fn new(cutoff: CutoffDate) -> Self {
        Self::with_timezone(cutoff, Local)
    }
}

impl<Tz: TimeZone> StalenessClassifier<Tz> {
    pub fn with_timezone(cutoff: CutoffDate, tz: Tz) -> Self {
        Self {
            cutoff,
            start_of_day: cutoff.0.and_time(NaiveTime::MIN),
            tz,
        }
    }

    pub fn cutoff(&self) -> CutoffDate {
        self.cutoff
    }

    /// Compares in local wall-clock time, against midnight of the cutoff date.
    /// `subject` names the object in the error when there is no timestamp.
    pub fn classify(
        &self,
        subject: &str,
        last_modified: Option<&ObjectTimestamp>,
    ) -> Result<Staleness, MediaError> {
        let last_modified = last_modified
            .ok_or_else(|| MediaError::MissingMetadata(subject.to_string()))?
            .local_in(&self.tz);

        if last_modified < self.start_of_day {
            Ok(Staleness::Stale)
        } else {
            Ok(Staleness::Current)
        }
    }
}
