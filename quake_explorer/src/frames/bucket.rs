//! Temporal bucketing: pick a granularity from the dataset span and floor
//! timestamps to bucket keys.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::data::QuakeEvent;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Time unit used to group events into frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// UTC floor of `time` to the start of its day, Monday-aligned week, or month.
    pub fn bucket_key(self, time: DateTime<Utc>) -> DateTime<Utc> {
        let date = time.date_naive();
        let start = match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
        };
        start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Display label for a bucket key.
    pub fn label(self, key: DateTime<Utc>) -> String {
        match self {
            Granularity::Daily => key.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => key.format("Week of %Y-%m-%d").to_string(),
            Granularity::Monthly => key.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        })
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ThresholdError {
    #[error("threshold must be a finite, non-negative day count (got {0})")]
    Invalid(f64),
    #[error("daily threshold {daily} exceeds weekly threshold {weekly}")]
    Unordered { daily: f64, weekly: f64 },
}

/// Span boundaries in days. Upper bounds are inclusive: a span equal to
/// `daily_max_days` is still daily.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GranularityThresholds {
    daily_max_days: f64,
    weekly_max_days: f64,
}

impl Default for GranularityThresholds {
    fn default() -> Self {
        Self {
            daily_max_days: 31.0,
            weekly_max_days: 180.0,
        }
    }
}

impl GranularityThresholds {
    pub fn new(daily_max_days: f64, weekly_max_days: f64) -> Result<Self, ThresholdError> {
        for value in [daily_max_days, weekly_max_days] {
            if !value.is_finite() || value < 0.0 {
                return Err(ThresholdError::Invalid(value));
            }
        }
        if daily_max_days > weekly_max_days {
            return Err(ThresholdError::Unordered {
                daily: daily_max_days,
                weekly: weekly_max_days,
            });
        }
        Ok(Self {
            daily_max_days,
            weekly_max_days,
        })
    }

    pub fn daily_max_days(&self) -> f64 {
        self.daily_max_days
    }

    pub fn weekly_max_days(&self) -> f64 {
        self.weekly_max_days
    }

    pub fn select(&self, span_days: f64) -> Granularity {
        if span_days <= self.daily_max_days {
            Granularity::Daily
        } else if span_days <= self.weekly_max_days {
            Granularity::Weekly
        } else {
            Granularity::Monthly
        }
    }
}

/// Fractional days between the earliest and latest event. `None` when empty.
pub fn span_days(events: &[QuakeEvent]) -> Option<f64> {
    let min = events.iter().map(|e| e.time).min()?;
    let max = events.iter().map(|e| e.time).max()?;
    Some((max - min).num_milliseconds() as f64 / MS_PER_DAY)
}
