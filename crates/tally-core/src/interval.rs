//! Resolved intervals and the admission predicate that keeps stored facts disjoint.
//!
//! All intervals are closed: `[start, end]`. Two facts that share a single second
//! therefore conflict, which is why a logical day ends one second before the next
//! one begins.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// A concrete time span with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResolvedInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ResolvedInterval {
    /// Creates an interval, rejecting spans whose end is not after their start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end <= start {
            return Err(TrackError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if this interval's start or end lies within `[start, end]`.
    pub fn has_endpoint_within(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        (self.start >= start && self.start <= end) || (self.end >= start && self.end <= end)
    }

    /// Returns true if the two closed intervals share at least one instant.
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for ResolvedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Returns true if no existing interval has its start or end inside `[start, end]`.
///
/// This is the endpoint check the store has always applied. It does not notice a
/// candidate that lies strictly inside a larger existing interval; see
/// [`OverlapRule::Intersection`] for the full check.
pub fn is_free<'a, I>(start: NaiveDateTime, end: NaiveDateTime, existing: I) -> bool
where
    I: IntoIterator<Item = &'a ResolvedInterval>,
{
    !existing
        .into_iter()
        .any(|interval| interval.has_endpoint_within(start, end))
}

/// How a candidate interval is tested against stored intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapRule {
    /// Reject only when a stored interval starts or ends inside the candidate ([`is_free`]).
    Endpoints,
    /// Reject whenever the candidate shares any instant with a stored interval.
    #[default]
    Intersection,
}

impl OverlapRule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Endpoints => "endpoints",
            Self::Intersection => "intersection",
        }
    }

    /// Returns true if `candidate` may be stored next to `existing`.
    pub fn admits(self, candidate: &ResolvedInterval, existing: &[ResolvedInterval]) -> bool {
        match self {
            Self::Endpoints => is_free(candidate.start, candidate.end, existing),
            Self::Intersection => !existing
                .iter()
                .any(|interval| interval.intersects(candidate)),
        }
    }
}

impl fmt::Display for OverlapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for unknown overlap rule names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown overlap rule: {0}")]
pub struct UnknownOverlapRule(String);

impl FromStr for OverlapRule {
    type Err = UnknownOverlapRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "endpoints" => Ok(Self::Endpoints),
            "intersection" => Ok(Self::Intersection),
            _ => Err(UnknownOverlapRule(s.to_string())),
        }
    }
}
