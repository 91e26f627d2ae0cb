//! Time windows for listing facts.

use chrono::{NaiveDate, NaiveDateTime};

use crate::completion::DayBoundary;
use crate::error::{Result, TrackError};
use crate::timeframe::TimeValue;

/// Selects facts that start at or after `start` and end at or before `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactFilter {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Case-insensitive substring of the activity or category name.
    pub search: Option<String>,
}

impl FactFilter {
    /// Builds a filter from loosely typed bounds.
    ///
    /// A date start means the start of that logical day, a date end means the end of
    /// that logical day, and a bare time refers to `today`.
    pub fn from_bounds(
        start: Option<TimeValue>,
        end: Option<TimeValue>,
        boundary: DayBoundary,
        today: NaiveDate,
    ) -> Result<Self> {
        let start = start.map(|value| match value {
            TimeValue::DateTime(datetime) => datetime,
            TimeValue::Date(date) => boundary.start_of_day(date),
            TimeValue::Time(time) => today.and_time(time),
        });
        let end = end
            .map(|value| match value {
                TimeValue::DateTime(datetime) => Ok(datetime),
                TimeValue::Date(date) => boundary.end_of_day(date),
                TimeValue::Time(time) => Ok(today.and_time(time)),
            })
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(TrackError::InvalidInterval { start, end });
            }
        }

        Ok(Self {
            start,
            end,
            search: None,
        })
    }

    /// The facts of the logical day named by `date`.
    pub fn day(date: NaiveDate, boundary: DayBoundary) -> Result<Self> {
        Ok(Self {
            start: Some(boundary.start_of_day(date)),
            end: Some(boundary.end_of_day(date)?),
            search: None,
        })
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }
}
