//! Facts and the activities and categories they are attributed to.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interval::ResolvedInterval;
use crate::types::{ActivityId, ActivityName, CategoryId, CategoryName, FactId};

/// A grouping of activities, e.g. "work".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<CategoryId>,
    pub name: CategoryName,
}

impl Category {
    /// A category that has not been persisted yet.
    pub const fn new(name: CategoryName) -> Self {
        Self { pk: None, name }
    }
}

/// Something time is spent on. Identified by its name together with its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<ActivityId>,
    pub name: ActivityName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Hidden from listings but kept because facts still reference it.
    #[serde(default)]
    pub deleted: bool,
}

impl Activity {
    /// An activity that has not been persisted yet.
    pub const fn new(name: ActivityName, category: Option<Category>) -> Self {
        Self {
            pk: None,
            name,
            category,
            deleted: false,
        }
    }

    /// Returns the category name, if any.
    pub fn category_name(&self) -> Option<&CategoryName> {
        self.category.as_ref().map(|category| &category.name)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{}@{}", self.name, category.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A stretch of time spent on an activity.
///
/// A fact starts out without a primary key and receives one when the store persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<FactId>,
    pub activity: Activity,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Fact {
    /// A new, unpersisted fact covering `interval`.
    pub fn new(activity: Activity, interval: ResolvedInterval, description: Option<String>) -> Self {
        Self {
            pk: None,
            activity,
            start: interval.start(),
            end: interval.end(),
            description,
        }
    }

    /// The fact's span, validated so that it ends after it starts.
    pub fn interval(&self) -> Result<ResolvedInterval> {
        ResolvedInterval::new(self.start, self.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.activity
        )?;
        if let Some(description) = &self.description {
            write!(f, ", {description}")?;
        }
        Ok(())
    }
}
