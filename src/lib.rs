//! Tally Store - Bucketed counter store with gap-filled time-series queries
//!
//! This library maintains named, incrementable counters attached to
//! arbitrary subjects (e.g. "rotations" on a ball), bucketed into fixed
//! time windows, and answers time-series queries that return a complete,
//! ordered, zero-filled sequence of (bucket timestamp, value) pairs at any
//! valid coarsening of a counter's base granularity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     CounterEngine                       │
//! │   register_counter / subject accessors / data_for       │
//! └─────────────────────────────────────────────────────────┘
//!           │ mutations                      │ queries
//!           ▼                                ▼
//! ┌──────────────────────┐       ┌──────────────────────────┐
//! │    CounterStore      │       │       QueryEngine        │
//! │ resolve bucket, then │       │ validate interval, scan, │
//! │ one atomic upsert    │       │ re-bucket, sum, gap-fill │
//! └──────────────────────┘       └──────────────────────────┘
//!           │                                │
//!           └────────────┬───────────────────┘
//!                        ▼
//!            ┌──────────────────────┐
//!            │    CounterBackend    │
//!            │ (trait; MemoryBackend│
//!            │  ships for testing)  │
//!            └──────────────────────┘
//! ```
//!
//! Bucket boundaries come in two flavors: fixed durations floor on epoch
//! seconds (zone-independent, DST-safe by construction), calendar units
//! truncate on a named zone's wall clock (day/week/month/year starts, DST
//! transitions handled explicitly). Time zones are always explicit
//! parameters, never ambient process state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod query;
pub mod registry;
pub mod series;
pub mod store;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{CounterEngine, SubjectCounters};
pub use error::{Error, Result};
pub use interval::{CalendarUnit, Interval};
pub use query::DataQuery;
pub use registry::CounterRegistry;
pub use store::{CounterBackend, CounterStore, MemoryBackend};
pub use types::{CounterRow, Direction, SeriesPoint, SubjectId, TimeRange};
