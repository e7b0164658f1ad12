//! Error taxonomy for the booking lifecycle.
//!
//! Three layers, each a `thiserror` enum:
//!
//! - [`StoreError`]: what a storage adapter or collaborator can report
//! - [`LifecycleError`]: what the pure transition functions and the reducer reject
//! - [`BookingError`]: what the service boundary surfaces to callers

use crate::status::BookingStatus;
use crate::types::BookingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by booking storage and read-only collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    ///
    /// Reported distinctly from other write failures so the caller can decide
    /// whether to allocate a new identifier or abort.
    #[error("Duplicate value for unique field {field}: {value}")]
    DuplicateKey {
        /// Name of the unique field
        field: String,
        /// Rejected value
        value: String,
    },

    /// Optimistic concurrency conflict: the record changed since it was read.
    #[error("Concurrency conflict on booking {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// Storage key of the record
        key: String,
        /// Version the writer read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The record to update does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Rejections produced by the pure lifecycle rules.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleError {
    /// The requested status is not an allowed successor of the current one.
    #[error("Cannot transition from \"{from}\" to \"{to}\"")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// Cancellation was requested without a reason.
    #[error("Cancellation reason is required")]
    MissingReason,

    /// A value is not a member of its enumerated vocabulary.
    #[error("Invalid {field}: \"{value}\"")]
    InvalidEnum {
        /// Field the value was supplied for
        field: String,
        /// Rejected value
        value: String,
    },

    /// A free-text field exceeds its maximum length.
    #[error("{field} cannot exceed {max} characters")]
    TooLong {
        /// Field name
        field: String,
        /// Maximum length in characters
        max: usize,
    },

    /// A command targeted a booking that is not loaded into the state.
    #[error("Booking not found")]
    NotLoaded,

    /// A creation command targeted a state that already holds a booking.
    #[error("Booking {key} already exists")]
    AlreadyCreated {
        /// Storage key of the booking already held
        key: BookingKey,
    },
}

impl LifecycleError {
    /// Builds an [`LifecycleError::InvalidEnum`].
    #[must_use]
    pub fn invalid_enum(field: &str, value: &str) -> Self {
        Self::InvalidEnum {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Stable classification of [`BookingError`] for boundary adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, caller-fixable
    ValidationFailure,
    /// Referenced entity absent
    NotFound,
    /// Catalog entry deactivated
    Inactive,
    /// Catalog entry not open for direct booking
    NotBookable,
    /// Preferred date before today
    PastDate,
    /// State machine violation
    InvalidTransition,
    /// Cancellation without reason
    MissingReason,
    /// Value outside an enumerated vocabulary
    InvalidEnum,
    /// Identifier space contention
    AllocationExhausted,
    /// Storage uniqueness violation
    DuplicateKey,
    /// Optimistic concurrency conflict
    ConcurrentModification,
    /// Any other storage failure
    Storage,
    /// Broken internal invariant
    Internal,
}

/// Errors surfaced by booking operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Malformed input; every failing field message is listed.
    #[error("Validation failed: {}", .0.join(". "))]
    Validation(Vec<String>),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The catalog entry exists but is deactivated.
    #[error("Puja is inactive")]
    Inactive,

    /// The catalog entry's type disallows direct booking.
    #[error("This puja is not available for direct booking. Please request a callback.")]
    NotBookable,

    /// The preferred date lies before the current calendar day.
    #[error("Preferred date {date} is in the past (today is {today})")]
    PastDate {
        /// Requested date
        date: chrono::NaiveDate,
        /// Current business date
        today: chrono::NaiveDate,
    },

    /// The requested status is not an allowed successor.
    #[error("Cannot transition from \"{from}\" to \"{to}\"")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// Cancellation without a reason.
    #[error("Cancellation reason is required")]
    MissingReason,

    /// Value outside an enumerated vocabulary.
    #[error("Invalid {field}: \"{value}\"")]
    InvalidEnum {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
    },

    /// Every identifier candidate collided.
    #[error("Unable to generate booking ID after {attempts} attempts. Please try again.")]
    AllocationExhausted {
        /// Attempts made
        attempts: u32,
    },

    /// Storage rejected a duplicate unique value.
    #[error("A record with this {field} already exists")]
    DuplicateKey {
        /// Unique field
        field: String,
        /// Rejected value
        value: String,
    },

    /// The booking changed between read and write.
    #[error("Booking {key} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        /// Storage key
        key: String,
        /// Version read
        expected: u64,
        /// Version found
        actual: u64,
    },

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// The engine broke one of its own invariants.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Single-message validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Stable classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Inactive => ErrorKind::Inactive,
            Self::NotBookable => ErrorKind::NotBookable,
            Self::PastDate { .. } => ErrorKind::PastDate,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::MissingReason => ErrorKind::MissingReason,
            Self::InvalidEnum { .. } => ErrorKind::InvalidEnum,
            Self::AllocationExhausted { .. } => ErrorKind::AllocationExhausted,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::Store(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the same call may succeed if simply repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllocationExhausted { .. } | Self::ConcurrentModification { .. }
        )
    }

    /// HTTP-style status code for boundary adapters.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::ValidationFailure
            | ErrorKind::NotBookable
            | ErrorKind::PastDate
            | ErrorKind::InvalidTransition
            | ErrorKind::MissingReason
            | ErrorKind::InvalidEnum => 400,
            ErrorKind::NotFound | ErrorKind::Inactive => 404,
            ErrorKind::DuplicateKey | ErrorKind::ConcurrentModification => 409,
            ErrorKind::AllocationExhausted | ErrorKind::Storage | ErrorKind::Internal => 500,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { field, value } => Self::DuplicateKey { field, value },
            StoreError::ConcurrencyConflict {
                key,
                expected,
                actual,
            } => Self::ConcurrentModification {
                key,
                expected,
                actual,
            },
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}

impl From<LifecycleError> for BookingError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            LifecycleError::MissingReason => Self::MissingReason,
            LifecycleError::InvalidEnum { field, value } => Self::InvalidEnum { field, value },
            err @ LifecycleError::TooLong { .. } => Self::Validation(vec![err.to_string()]),
            LifecycleError::NotLoaded => Self::NotFound("Booking".to_string()),
            LifecycleError::AlreadyCreated { key } => Self::DuplicateKey {
                field: "key".to_string(),
                value: key.to_string(),
            },
        }
    }
}
