//! Public caller surface
//!
//! [`CounterEngine`] wires the registry, the backend, and the query engine
//! together. Domain code attaches counters to its entities by registering a
//! definition once, then obtaining a [`SubjectCounters`] accessor per entity
//! instance, scoped to (subject_type, subject_id). No dynamic wiring: the
//! accessor is a plain factory product over the shared registry and backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_store::{CounterEngine, Interval, MemoryBackend};
//!
//! let engine = CounterEngine::new(Arc::new(MemoryBackend::new()));
//! engine.register_counter("Ball", "rotations", Interval::minutes(5)?)?;
//!
//! let ball = engine.subject("Ball", Some(1));
//! ball.increment("rotations", 1, None, false).await?;
//!
//! // default interval and range; use `query()` + `run()` for coarsening
//! let series = ball.data_for("rotations").await?;
//! ```

use std::sync::Arc;

use chrono_tz::Tz;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::interval::Interval;
use crate::query::{DataQuery, QueryEngine};
use crate::registry::CounterRegistry;
use crate::store::{CounterBackend, CounterStore};
use crate::types::{CounterRow, Direction, SeriesPoint, SubjectId};

/// The counter engine: registry + backend + query execution
pub struct CounterEngine {
    registry: Arc<CounterRegistry>,
    backend: Arc<dyn CounterBackend>,
    queries: Arc<QueryEngine>,
    zone: Tz,
}

impl CounterEngine {
    /// Create an engine over a backend with default configuration
    pub fn new(backend: Arc<dyn CounterBackend>) -> Self {
        let config = EngineConfig::default();
        let registry = Arc::new(CounterRegistry::new());
        let queries = Arc::new(QueryEngine::new(
            Arc::clone(&registry),
            Arc::clone(&backend),
            config.max_series_len,
        ));
        Self {
            registry,
            backend,
            queries,
            zone: chrono_tz::UTC,
        }
    }

    /// Create an engine over a backend with explicit configuration
    pub fn with_config(backend: Arc<dyn CounterBackend>, config: EngineConfig) -> Result<Self> {
        let zone = config.zone()?;
        let registry = Arc::new(CounterRegistry::new());
        let queries = Arc::new(QueryEngine::new(
            Arc::clone(&registry),
            Arc::clone(&backend),
            config.max_series_len,
        ));
        Ok(Self {
            registry,
            backend,
            queries,
            zone,
        })
    }

    /// Declare a counter for a subject type
    ///
    /// Idempotent for identical intervals; conflicting redefinition is a
    /// `DuplicateDefinition` error.
    pub fn register_counter(&self, subject_type: &str, name: &str, base: Interval) -> Result<()> {
        self.registry.register(subject_type, name, base)?;
        Ok(())
    }

    /// The shared counter registry
    pub fn registry(&self) -> &CounterRegistry {
        &self.registry
    }

    /// Scoped mutation handle for one counter on one subject
    ///
    /// Fails with `CounterNotFound` if the counter was never registered for
    /// the subject type.
    pub fn counter(
        &self,
        subject_type: &str,
        subject_id: Option<SubjectId>,
        name: &str,
    ) -> Result<CounterStore> {
        let base = self.registry.base_interval_for(subject_type, name)?;
        Ok(CounterStore::new(
            subject_type.to_string(),
            subject_id,
            name.to_string(),
            base,
            self.zone,
            Arc::clone(&self.backend),
        ))
    }

    /// Accessor for all counters of one subject instance
    pub fn subject(&self, subject_type: &str, subject_id: Option<SubjectId>) -> SubjectCounters {
        SubjectCounters {
            subject_type: subject_type.to_string(),
            subject_id,
            registry: Arc::clone(&self.registry),
            backend: Arc::clone(&self.backend),
            queries: Arc::clone(&self.queries),
            zone: self.zone,
        }
    }

    /// Run an aggregation query
    pub async fn data_for(&self, query: &DataQuery) -> Result<Vec<SeriesPoint>> {
        self.queries.data_for(query).await
    }
}

/// Counter accessor scoped to one subject instance
///
/// The wiring collaborator of the engine: a domain entity holds (or
/// constructs) one of these and talks to its counters by name. All
/// operations validate the counter definition before touching storage.
pub struct SubjectCounters {
    subject_type: String,
    subject_id: Option<SubjectId>,
    registry: Arc<CounterRegistry>,
    backend: Arc<dyn CounterBackend>,
    queries: Arc<QueryEngine>,
    zone: Tz,
}

impl SubjectCounters {
    fn counter(&self, name: &str) -> Result<CounterStore> {
        let base = self.registry.base_interval_for(&self.subject_type, name)?;
        Ok(CounterStore::new(
            self.subject_type.clone(),
            self.subject_id,
            name.to_string(),
            base,
            self.zone,
            Arc::clone(&self.backend),
        ))
    }

    /// Increment a counter's bucket by `amount` (1 for plain ticks)
    ///
    /// `at` defaults to now; with `force` the bucket is reset to `amount`
    /// instead of accumulated. Returns the bucket value after the call.
    pub async fn increment(
        &self,
        name: &str,
        amount: i64,
        at: Option<i64>,
        force: bool,
    ) -> Result<i64> {
        self.counter(name)?
            .change(amount, Direction::Up, at, force)
            .await
    }

    /// Decrement a counter's bucket by `amount`
    ///
    /// Decrements below zero are allowed; values are signed.
    pub async fn decrement(
        &self,
        name: &str,
        amount: i64,
        at: Option<i64>,
        force: bool,
    ) -> Result<i64> {
        self.counter(name)?
            .change(amount, Direction::Down, at, force)
            .await
    }

    /// Directed mutation with an explicit [`Direction`]
    pub async fn change(
        &self,
        name: &str,
        amount: i64,
        direction: Direction,
        at: Option<i64>,
        force: bool,
    ) -> Result<i64> {
        self.counter(name)?.change(amount, direction, at, force).await
    }

    /// Create (or with `force` overwrite) the bucket row containing `at`
    pub async fn make(
        &self,
        name: &str,
        value: i64,
        at: Option<i64>,
        force: bool,
    ) -> Result<CounterRow> {
        self.counter(name)?.make(value, at, force).await
    }

    /// Set the bucket containing `at` to `value` unconditionally
    pub async fn reset(&self, name: &str, value: i64, at: Option<i64>) -> Result<i64> {
        self.counter(name)?.reset_to(value, at).await
    }

    /// Query builder pre-scoped to this subject
    pub fn query(&self, name: &str) -> DataQuery {
        let query = DataQuery::new(&self.subject_type, name).zone(self.zone);
        match self.subject_id {
            Some(id) => query.subject(id),
            None => query,
        }
    }

    /// Aggregated series for one of this subject's counters
    ///
    /// Runs the scoped query at the counter's base interval over the full
    /// stored extent. For a coarser interval, an explicit range, or another
    /// zone, build with [`query`](Self::query) and execute via
    /// [`run`](Self::run).
    pub async fn data_for(&self, name: &str) -> Result<Vec<SeriesPoint>> {
        self.run(&self.query(name)).await
    }

    /// Execute a prepared query against the shared backend
    pub async fn run(&self, query: &DataQuery) -> Result<Vec<SeriesPoint>> {
        self.queries.data_for(query).await
    }
}
