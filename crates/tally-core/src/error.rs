//! Error taxonomy shared by parsing, completion and fact admission.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::ValidationError;

/// Errors produced by the tracking core.
///
/// Every error is returned to the immediate caller; nothing is retried internally.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Strict parsing would have to discard or guess part of the input.
    #[error("ambiguous time expression {input:?}: {reason}")]
    ParseAmbiguous { input: String, reason: &'static str },

    /// A time frame was assembled from fields that cannot be completed together.
    #[error("invalid time frame field {field}: {reason}")]
    InvalidFrame {
        field: &'static str,
        reason: &'static str,
    },

    /// A resolved interval does not end after it starts.
    #[error("interval end {end} is not after its start {start}")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The candidate interval intersects an interval that is already stored.
    #[error("time window {start} - {end} is already occupied by another fact")]
    Conflict {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The operation does not apply to the fact's lifecycle state.
    #[error("invalid fact state: {0}")]
    InvalidState(&'static str),

    /// The referenced entity does not exist in the store.
    #[error("no {entity} found for {key}")]
    NotFound { entity: &'static str, key: String },

    /// A name or other value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The persistence collaborator failed for a reason the core does not interpret.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TrackError {
    /// Builds a [`TrackError::NotFound`] for the given entity kind and key.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Result alias for tracking operations.
pub type Result<T, E = TrackError> = std::result::Result<T, E>;
