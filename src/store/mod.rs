//! SQLite-backed persistence for the project hierarchy.
//!
//! `RecordStore` owns a single connection behind a mutex; every entity is
//! keyed by id and timestamps round-trip as RFC 3339 text. Queued tasks
//! double as the engine's durable work queue.

mod records;

pub use records::RecordStore;
