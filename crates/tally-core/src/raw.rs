//! Raw fact parsing: `<time info> <activity>[@<category>][, <description>]`.

use chrono::NaiveDateTime;

use crate::completion::{DayBoundary, complete_at};
use crate::error::{Result, TrackError};
use crate::fact::{Activity, Category, Fact};
use crate::timeframe::{TimeFrame, scan};
use crate::types::{ActivityName, CategoryName};

/// A fact as typed by a user, before its time frame has been completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFact {
    pub frame: TimeFrame,
    pub activity: ActivityName,
    pub category: Option<CategoryName>,
    pub description: Option<String>,
}

impl RawFact {
    /// Parses a raw fact such as `-30 coding@work, reviewing PRs`.
    ///
    /// The time information is optional. A range whose end cannot be read is rejected
    /// instead of leaking the unread part into the activity name.
    pub fn parse(text: &str) -> Result<Self> {
        let info = scan(text);
        if info.truncated {
            return Err(TrackError::ParseAmbiguous {
                input: text.to_string(),
                reason: "unreadable range end after '-'",
            });
        }

        let (head, description) = match info.rest.split_once(',') {
            Some((head, description)) => (head, non_empty(description)),
            None => (info.rest, None),
        };
        let (activity, category) = match head.split_once('@') {
            Some((activity, category)) => (activity, non_empty(category)),
            None => (head, None),
        };

        Ok(Self {
            frame: info.frame,
            activity: ActivityName::new(activity)?,
            category: category.map(CategoryName::new).transpose()?,
            description,
        })
    }

    /// Completes the time frame and builds an unpersisted [`Fact`].
    pub fn resolve(&self, boundary: DayBoundary, now: NaiveDateTime) -> Result<Fact> {
        let interval = complete_at(&self.frame, boundary, now)?;
        let activity = Activity::new(
            self.activity.clone(),
            self.category.clone().map(Category::new),
        );
        Ok(Fact::new(activity, interval, self.description.clone()))
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
