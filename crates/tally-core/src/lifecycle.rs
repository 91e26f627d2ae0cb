//! Fact creation, update and removal with non-overlap admission.
//!
//! # Concurrency
//!
//! Admission is check-then-act: the stored intervals are read, the candidate is tested,
//! and only then is the fact committed. Nothing here locks the store, so two writers
//! sharing one database can both pass the check and commit overlapping facts. Callers
//! must serialize writers themselves; the SQLite store adds overlap triggers as a
//! second line of defence.

use chrono::{Local, NaiveDateTime, SubsecRound};

use crate::completion::DayBoundary;
use crate::error::{Result, TrackError};
use crate::fact::Fact;
use crate::interval::{OverlapRule, ResolvedInterval};
use crate::raw::RawFact;
use crate::types::FactId;

/// Persistence collaborator for facts.
pub trait FactStore {
    /// All stored fact intervals, leaving out the fact with primary key `exclude`.
    fn list_intervals_excluding(&self, exclude: Option<FactId>) -> Result<Vec<ResolvedInterval>>;

    /// Stores `fact`: inserts it when it has no primary key, replaces it otherwise.
    ///
    /// Returns the stored fact with its primary key set.
    fn commit(&mut self, fact: Fact) -> Result<Fact>;

    /// Deletes the fact with primary key `pk`, failing with `NotFound` if there is none.
    fn delete(&mut self, pk: FactId) -> Result<()>;
}

/// Creates, updates and removes facts while keeping stored facts disjoint.
#[derive(Debug)]
pub struct FactLifecycle<S> {
    store: S,
    boundary: DayBoundary,
    overlap: OverlapRule,
}

impl<S: FactStore> FactLifecycle<S> {
    pub fn new(store: S, boundary: DayBoundary) -> Self {
        Self {
            store,
            boundary,
            overlap: OverlapRule::default(),
        }
    }

    #[must_use]
    pub const fn with_overlap_rule(mut self, overlap: OverlapRule) -> Self {
        self.overlap = overlap;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub const fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    /// Stores a new fact whose interval is already resolved.
    pub fn create(&mut self, fact: Fact) -> Result<Fact> {
        if fact.pk.is_some() {
            return Err(TrackError::InvalidState(
                "fact already has a primary key; update it instead",
            ));
        }
        self.admit(&fact, None)?;
        let stored = self.store.commit(fact)?;
        tracing::debug!(fact_id = ?stored.pk, start = %stored.start, end = %stored.end, "created fact");
        Ok(stored)
    }

    /// Parses and stores a raw fact, completing its time frame against the wall clock.
    pub fn create_raw(&mut self, text: &str) -> Result<Fact> {
        self.create_raw_at(text, Local::now().naive_local().trunc_subsecs(0))
    }

    /// Parses and stores a raw fact, completing its time frame against `now`.
    pub fn create_raw_at(&mut self, text: &str, now: NaiveDateTime) -> Result<Fact> {
        let fact = RawFact::parse(text)?.resolve(self.boundary, now)?;
        self.create(fact)
    }

    /// Replaces a stored fact, checking overlap against every other stored fact.
    pub fn update(&mut self, fact: Fact) -> Result<Fact> {
        let Some(pk) = fact.pk else {
            return Err(TrackError::InvalidState(
                "fact has no primary key; create it instead",
            ));
        };
        self.admit(&fact, Some(pk))?;
        let stored = self.store.commit(fact)?;
        tracing::debug!(fact_id = %pk, "updated fact");
        Ok(stored)
    }

    /// Deletes a stored fact. No overlap check is needed.
    pub fn remove(&mut self, pk: FactId) -> Result<()> {
        self.store.delete(pk)?;
        tracing::debug!(fact_id = %pk, "removed fact");
        Ok(())
    }

    fn admit(&self, fact: &Fact, exclude: Option<FactId>) -> Result<()> {
        let candidate = fact.interval()?;
        let existing = self.store.list_intervals_excluding(exclude)?;
        if self.overlap.admits(&candidate, &existing) {
            return Ok(());
        }
        tracing::debug!(
            start = %candidate.start(),
            end = %candidate.end(),
            rule = %self.overlap,
            "rejected overlapping fact"
        );
        Err(TrackError::Conflict {
            start: candidate.start(),
            end: candidate.end(),
        })
    }
}
