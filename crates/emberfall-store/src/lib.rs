//! Emberfall Store — persistence for the engine.
//!
//! Two `ObjectStore` implementations (in-memory and Postgres) plus the
//! background write queue used for best-effort diary persistence.

pub mod memory;
pub mod pg;
pub mod write_queue;

pub use memory::MemoryStore;
pub use pg::PgObjectStore;
pub use write_queue::WriteQueue;
