//! Core domain logic for tally.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: turning loose time expressions into partial time frames
//! - Completion: resolving frames into concrete intervals around a day boundary
//! - Admission: keeping stored facts free of overlaps
//! - Lifecycle: creating, updating and removing facts through a [`FactStore`]

mod completion;
mod error;
mod fact;
mod filter;
mod interval;
mod lifecycle;
mod raw;
pub mod timeframe;
pub mod types;

pub use completion::{DayBoundary, complete, complete_at};
pub use error::{Result, TrackError};
pub use fact::{Activity, Category, Fact};
pub use filter::FactFilter;
pub use interval::{OverlapRule, ResolvedInterval, UnknownOverlapRule, is_free};
pub use lifecycle::{FactLifecycle, FactStore};
pub use raw::RawFact;
pub use timeframe::{TimeFrame, TimeValue, parse, parse_strict, parse_time_value};
pub use types::{ActivityId, ActivityName, CategoryId, CategoryName, FactId, ValidationError};
