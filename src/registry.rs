//! Counter registry: (subject_type, name) -> base interval
//!
//! The registry is the source of truth for a counter's declared granularity.
//! It is populated once at configuration time and read on every mutation and
//! query, so it is a read-mostly `RwLock`-guarded map: concurrent reads take
//! the shared lock, registration serializes on the exclusive lock.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{DefinitionError, IntervalError};
use crate::interval::Interval;

/// Registry of counter definitions
///
/// A definition is immutable once declared: re-registering with an identical
/// interval is a no-op, re-registering with a different interval is a
/// [`DefinitionError::DuplicateDefinition`].
///
/// # Example
///
/// ```rust
/// use tally_store::interval::Interval;
/// use tally_store::registry::CounterRegistry;
///
/// let registry = CounterRegistry::new();
/// registry.register("Ball", "rotations", Interval::minutes(5).unwrap()).unwrap();
///
/// let base = registry.base_interval_for("Ball", "rotations").unwrap();
/// assert_eq!(base, Interval::minutes(5).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct CounterRegistry {
    definitions: RwLock<HashMap<(String, String), Interval>>,
}

impl CounterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a counter for a subject type
    ///
    /// Idempotent for identical intervals; conflicting redefinition fails.
    pub fn register(
        &self,
        subject_type: &str,
        name: &str,
        base: Interval,
    ) -> Result<(), DefinitionError> {
        let key = (subject_type.to_string(), name.to_string());
        let mut definitions = self.definitions.write();
        if let Some(existing) = definitions.get(&key) {
            if *existing == base {
                return Ok(());
            }
            return Err(DefinitionError::DuplicateDefinition {
                subject_type: subject_type.to_string(),
                name: name.to_string(),
                existing: *existing,
                requested: base,
            });
        }
        debug!(subject_type, name, %base, "registered counter");
        definitions.insert(key, base);
        Ok(())
    }

    /// Look up the declared base interval of a counter
    pub fn base_interval_for(
        &self,
        subject_type: &str,
        name: &str,
    ) -> Result<Interval, DefinitionError> {
        self.definitions
            .read()
            .get(&(subject_type.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| DefinitionError::CounterNotFound {
                subject_type: subject_type.to_string(),
                name: name.to_string(),
            })
    }

    /// Validate and normalize a requested query interval against the base
    ///
    /// Rules:
    /// - absent request -> the base interval;
    /// - scalar magnitude below the base -> [`IntervalError::TooSmall`]
    ///   (calendar units compare by their approximate reference magnitude;
    ///   the comparison is advisory and deliberately imprecise);
    /// - a fixed request over a fixed base must be an exact integer multiple
    ///   of it, else [`IntervalError::NotMultiple`]; calendar requests and
    ///   calendar bases skip the multiple check.
    pub fn validate_query_interval(
        &self,
        subject_type: &str,
        name: &str,
        requested: Option<Interval>,
    ) -> Result<Interval, crate::error::Error> {
        let base = self.base_interval_for(subject_type, name)?;

        let requested = match requested {
            None => return Ok(base),
            Some(interval) => interval,
        };

        if requested.to_scalar() < base.to_scalar() {
            return Err(IntervalError::TooSmall {
                subject_type: subject_type.to_string(),
                name: name.to_string(),
                requested,
                base,
            }
            .into());
        }

        if let (Some(req_secs), Some(base_secs)) =
            (requested.fixed_seconds(), base.fixed_seconds())
        {
            if req_secs % base_secs != 0 {
                return Err(IntervalError::NotMultiple {
                    subject_type: subject_type.to_string(),
                    name: name.to_string(),
                    requested,
                    base,
                }
                .into());
            }
        }

        Ok(requested)
    }
}
