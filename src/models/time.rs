//! Date ranges and bucket granularities.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const ISO_DAY_FORMAT: &str = "%Y-%m-%d";

/// Calendar years a request may address.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;
/// Longest accepted range, in days (about ten years of daily buckets).
pub const MAX_RANGE_DAYS: i64 = 3660;

/// Requested time resolution of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "m")]
    Month,
    /// Twelve monthly buckets of a single year.
    #[serde(rename = "y")]
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "d",
            Granularity::Week => "w",
            Granularity::Month => "m",
            Granularity::Year => "y",
        }
    }

    /// The bucketing strategy used to fold days for this granularity.
    pub fn bucket_mode(&self) -> BucketMode {
        match self {
            Granularity::Day => BucketMode::Day,
            Granularity::Week => BucketMode::IsoWeek,
            Granularity::Month | Granularity::Year => BucketMode::Month,
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "d" => Ok(Granularity::Day),
            "w" => Ok(Granularity::Week),
            "m" => Ok(Granularity::Month),
            "y" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// How a single day maps onto a bucket label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    /// `YYYY-MM-DD` of the day itself.
    Day,
    /// `YYYY-MM-DD` of the Monday starting the ISO week.
    IsoWeek,
    /// `YYYY-MM`.
    Month,
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses two `YYYY-MM-DD` strings. `None` on malformed input.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), ISO_DAY_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(end.trim(), ISO_DAY_FORMAT).ok()?;
        Some(Self { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Inclusive day count, at least 1.
    pub fn length_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(1)
    }

    /// Same-length window ending the day before `start`.
    ///
    /// Empty when the window would fall before the first representable date.
    pub fn previous(&self) -> Self {
        let window = (self.length_days() - 1) as u64;
        self.start
            .checked_sub_days(Days::new(1))
            .and_then(|prev_end| {
                prev_end
                    .checked_sub_days(Days::new(window))
                    .map(|prev_start| Self::new(prev_start, prev_end))
            })
            .unwrap_or(Self::EMPTY)
    }

    /// Checks the range is ordered, inside `MIN_YEAR..=MAX_YEAR` and at
    /// most `MAX_RANGE_DAYS` long.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err(format!("end {} is before start {}", self.end, self.start));
        }
        for day in [self.start, self.end] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&day.year()) {
                return Err(format!(
                    "date {} is outside the years {}..={}",
                    day, MIN_YEAR, MAX_YEAR
                ));
            }
        }
        if self.length_days() > MAX_RANGE_DAYS {
            return Err(format!(
                "range spans {} days, the limit is {}",
                self.length_days(),
                MAX_RANGE_DAYS
            ));
        }
        Ok(())
    }

    /// A range containing no day.
    pub const EMPTY: Self = Self {
        start: NaiveDate::MAX,
        end: NaiveDate::MIN,
    };
}
