//! Error types for the counter engine
//!
//! The taxonomy is split per domain: definition lookup, interval validation,
//! mutation semantics, and backend failures. Every variant carries the
//! structured context (counter name, subject type, offending interval)
//! needed to render a precise diagnostic; the `#[error]` attributes are the
//! formatting layer and stay separate from the carried fields.

use thiserror::Error;

use crate::interval::Interval;

/// Main error type for the counter engine
#[derive(Error, Debug)]
pub enum Error {
    /// Counter definition error (unknown counter, conflicting registration)
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Query interval validation error
    #[error("Interval error: {0}")]
    Interval(#[from] IntervalError),

    /// Mutation error (direction, conflicts, overflow)
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    /// Backing-store error, surfaced unchanged
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Counter definition errors
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// No counter with this name is registered for the subject type
    #[error("Unable to find counter '{name}' for subject type '{subject_type}'")]
    CounterNotFound {
        /// Subject type the lookup was scoped to
        subject_type: String,
        /// Counter name that was requested
        name: String,
    },

    /// Re-registration with a different base interval
    #[error(
        "Counter '{name}' for subject type '{subject_type}' is already defined \
         with interval {existing}, refusing to redefine as {requested}"
    )]
    DuplicateDefinition {
        /// Subject type owning the counter
        subject_type: String,
        /// Counter name
        name: String,
        /// The interval the counter was originally declared with
        existing: Interval,
        /// The conflicting interval of the new registration
        requested: Interval,
    },
}

/// Query interval validation errors
///
/// Raised before any storage access when a requested query interval is
/// incompatible with the counter's declared base interval.
#[derive(Error, Debug)]
pub enum IntervalError {
    /// Requested interval is finer than the counter's base interval
    #[error(
        "Specified interval ({requested}) could not be less than the defined \
         interval ({base}) of counter '{name}' on subject type '{subject_type}'"
    )]
    TooSmall {
        /// Subject type owning the counter
        subject_type: String,
        /// Counter name
        name: String,
        /// The interval the query asked for
        requested: Interval,
        /// The counter's declared base interval
        base: Interval,
    },

    /// Requested fixed duration is not an integer multiple of the base
    #[error(
        "Specified interval ({requested}) should be a multiple of the defined \
         interval ({base}) of counter '{name}' on subject type '{subject_type}'"
    )]
    NotMultiple {
        /// Subject type owning the counter
        subject_type: String,
        /// Counter name
        name: String,
        /// The interval the query asked for
        requested: Interval,
        /// The counter's declared base interval
        base: Interval,
    },

    /// Fixed durations must span at least one second
    #[error("Fixed interval must be a positive number of seconds")]
    ZeroDuration,
}

/// Mutation errors
#[derive(Error, Debug)]
pub enum MutationError {
    /// Direction string was neither an increase nor a decrease
    #[error("Wrong direction '{given}' for counter. Possible values are 'up' and 'down'")]
    InvalidDirection {
        /// The unrecognized direction token
        given: String,
    },

    /// Non-forced `make` against an already-populated bucket
    #[error(
        "Counter '{name}' on subject type '{subject_type}' already has a row \
         for bucket {bucket_time}; pass force to overwrite"
    )]
    BucketConflict {
        /// Subject type owning the counter
        subject_type: String,
        /// Counter name
        name: String,
        /// Canonical bucket boundary, epoch seconds
        bucket_time: i64,
    },

    /// Accumulation exceeded the 64-bit signed range
    #[error(
        "Value overflow for counter '{name}' on subject type '{subject_type}' \
         at bucket {bucket_time}"
    )]
    Overflow {
        /// Subject type owning the counter
        subject_type: String,
        /// Counter name
        name: String,
        /// Canonical bucket boundary, epoch seconds
        bucket_time: i64,
    },
}

/// Backing-store errors
///
/// Propagated unmodified; the engine performs no internal retries because
/// blind retries of non-idempotent upserts are unsafe.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// IO failure inside the backend
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Conditional insert found an existing row
    #[error("Row already exists for bucket {bucket_time}")]
    RowExists {
        /// Canonical bucket boundary, epoch seconds
        bucket_time: i64,
    },

    /// An atomic add overflowed the stored accumulator
    #[error("Stored value overflow at bucket {bucket_time}")]
    Overflow {
        /// Canonical bucket boundary, epoch seconds
        bucket_time: i64,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
