//! Date window and PR state selection.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The PR timestamp the date window applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// Merged in the window (default)
    #[default]
    Merged,
    /// Closed in the window
    Closed,
    /// Updated in the window
    Updated,
    /// Created in the window
    Created,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Merged => write!(f, "merged"),
            PrState::Closed => write!(f, "closed"),
            PrState::Updated => write!(f, "updated"),
            PrState::Created => write!(f, "created"),
        }
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting a start after the end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Start date {} is after end date {}", start, end);
        }
        Ok(Self { start, end })
    }

    /// Fill in missing ends relative to `today`.
    ///
    /// The start defaults to Monday of this week, or last week's Monday
    /// when today is Monday. The end defaults to yesterday.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self> {
        let start = start.unwrap_or_else(|| default_start(today));
        let end = end.unwrap_or_else(|| today - Duration::days(1));
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// GitHub search qualifier, e.g. `merged:2024-03-04..2024-03-08`.
    pub fn qualifier(&self, state: PrState) -> String {
        format!(
            "{}:{}..{}",
            state,
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

fn default_start(today: NaiveDate) -> NaiveDate {
    match today.weekday().num_days_from_monday() {
        0 => today - Duration::days(7),
        offset => today - Duration::days(i64::from(offset)),
    }
}
