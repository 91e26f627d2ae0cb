//! Completion of partial time frames into concrete intervals.
//!
//! A logical day does not have to start at midnight. With a day boundary of `05:30`
//! the day of 2015-12-10 runs from `2015-12-10 05:30:00` to `2015-12-11 05:29:59`, and
//! an end time before `05:30` belongs to the following calendar day.

use std::fmt;

use chrono::{Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::interval::ResolvedInterval;
use crate::timeframe::TimeFrame;

/// The time of day at which a logical day begins.
///
/// Read-only configuration, passed explicitly to every completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayBoundary(NaiveTime);

impl DayBoundary {
    /// Midnight: logical days coincide with calendar days.
    pub const MIDNIGHT: Self = Self(NaiveTime::MIN);

    pub const fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// The time of day at which the logical day starts.
    pub const fn time(self) -> NaiveTime {
        self.0
    }

    pub fn is_midnight(self) -> bool {
        self.0 == NaiveTime::MIN
    }

    /// The last second of a logical day: one second before the boundary.
    ///
    /// Wraps across midnight, so a `00:00:00` boundary gives `23:59:59`.
    pub fn day_end(self) -> NaiveTime {
        self.0.overflowing_sub_signed(Duration::seconds(1)).0
    }

    /// The instant the logical day named by `date` begins.
    pub fn start_of_day(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }

    /// The instant the logical day named by `date` ends.
    ///
    /// Unless the boundary is midnight, that instant falls on the next calendar day.
    pub fn end_of_day(self, date: NaiveDate) -> Result<NaiveDateTime> {
        let date = if self.is_midnight() {
            date
        } else {
            next_day(date)?
        };
        Ok(date.and_time(self.day_end()))
    }

    /// The logical day that `at` falls on.
    ///
    /// Instants before the boundary belong to the previous calendar day.
    pub fn logical_date(self, at: NaiveDateTime) -> NaiveDate {
        let date = at.date();
        if at.time() >= self.0 {
            return date;
        }
        date.checked_sub_days(Days::new(1)).unwrap_or(date)
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Completes `frame` against the local wall clock.
///
/// `now` is truncated to whole seconds before it is used.
pub fn complete(frame: &TimeFrame, boundary: DayBoundary) -> Result<ResolvedInterval> {
    complete_at(frame, boundary, Local::now().naive_local().trunc_subsecs(0))
}

/// Completes `frame` into a concrete interval, taking `now` as the current time.
///
/// Fallback rules:
/// - with an offset, the start is `now - offset`;
/// - otherwise a missing start date is today and a missing start time is the boundary;
/// - a missing end date is the start's date;
/// - unless the boundary is midnight, the end date moves one calendar day forward when
///   the end time is missing or earlier than the boundary;
/// - a missing end time is [`DayBoundary::day_end`].
pub fn complete_at(
    frame: &TimeFrame,
    boundary: DayBoundary,
    now: NaiveDateTime,
) -> Result<ResolvedInterval> {
    validate(frame)?;

    let start = match frame.offset {
        Some(offset) => now
            .checked_sub_signed(offset)
            .ok_or(TrackError::InvalidFrame {
                field: "offset",
                reason: "reaches outside the supported date range",
            })?,
        None => frame
            .start_date
            .unwrap_or_else(|| now.date())
            .and_time(frame.start_time.unwrap_or_else(|| boundary.time())),
    };

    let mut end_date = frame.end_date.unwrap_or_else(|| start.date());
    if !boundary.is_midnight() && frame.end_time.is_none_or(|time| time < boundary.time()) {
        end_date = next_day(end_date)?;
    }
    let end = end_date.and_time(frame.end_time.unwrap_or_else(|| boundary.day_end()));

    ResolvedInterval::new(start, end)
}

/// Rejects frames that the parser would never produce.
fn validate(frame: &TimeFrame) -> Result<()> {
    let Some(offset) = frame.offset else {
        return Ok(());
    };
    if frame.has_absolute_fields() {
        return Err(TrackError::InvalidFrame {
            field: "offset",
            reason: "cannot be combined with absolute dates or times",
        });
    }
    if offset < Duration::zero() {
        return Err(TrackError::InvalidFrame {
            field: "offset",
            reason: "must not be negative",
        });
    }
    Ok(())
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or(TrackError::InvalidFrame {
            field: "end_date",
            reason: "reaches outside the supported date range",
        })
}
