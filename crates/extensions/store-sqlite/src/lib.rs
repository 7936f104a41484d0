//! SQLite knowledge store for webinfer.
//!
//! Keeps per-site inferences (current plus history) and the cross-site
//! pattern table in a single database file.

mod backend;
mod rows;
mod schema;

pub use backend::SqliteKnowledgeStore;
