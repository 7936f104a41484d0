//! In-memory knowledge store for webinfer.
//!
//! Used for tests and ephemeral runs; everything is lost when the process exits.

mod store;

pub use store::MemoryKnowledgeStore;
