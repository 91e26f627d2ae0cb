//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty (or only whitespace).
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The provided value contains a character reserved by the raw fact syntax.
    #[error("{field} cannot contain '{reserved}': {value}")]
    ReservedCharacter {
        field: &'static str,
        reserved: char,
        value: String,
    },
}

/// Generates a validated, trimmed name newtype with common trait implementations.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal, reserved = [$($reserved:literal),*]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new name after trimming and validation.
            pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
                let name = name.into();
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                $(
                    if trimmed.contains($reserved) {
                        return Err(ValidationError::ReservedCharacter {
                            field: $field_name,
                            reserved: $reserved,
                            value: trimmed.to_string(),
                        });
                    }
                )*
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(
    /// A validated category name.
    ///
    /// Category names are unique within a store; lookups compare them exactly.
    CategoryName, "category name", reserved = [',']
);

define_name!(
    /// A validated activity name.
    ///
    /// An activity is identified by its name together with its (optional) category.
    ActivityName, "activity name", reserved = ['@', ',']
);

/// Generates a primary key newtype over an `i64` row id.
macro_rules! define_pk {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_pk!(
    /// Primary key of a persisted fact.
    FactId
);

define_pk!(
    /// Primary key of a persisted activity.
    ActivityId
);

define_pk!(
    /// Primary key of a persisted category.
    CategoryId
);
