//! Counter storage: backend trait, in-memory backend, mutation handle
//!
//! The mutation path is: resolve the bucket boundary, then one atomic
//! conditional upsert against a [`CounterBackend`]. Relational backends live
//! outside this crate; [`MemoryBackend`] ships for tests and prototyping.

pub mod backend;
pub mod counter;
pub mod memory;

pub use backend::CounterBackend;
pub use counter::CounterStore;
pub use memory::MemoryBackend;
