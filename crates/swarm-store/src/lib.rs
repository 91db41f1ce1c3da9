//! Per-process `SQLite` persistence for the Swarm coordination substrate.
//!
//! One database file per agent process (`DB_PATH`), tables mirroring the
//! value objects: `agents`, `thoughts`, `decisions`, `pheromones`,
//! `collective_memories`. Writes are idempotent upserts by primary key and
//! lossy on crash between flushes -- persistence is best effort by design.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::SwarmStore;
