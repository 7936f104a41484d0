//! # webinfer Engine
//!
//! Orchestrates one page analysis: extraction, store lookup, pattern reuse,
//! classification with retries, and write-back.
//!
//! ## Decision order per section
//!
//! 1. Current stored inference with a matching content hash (`cache-hit`)
//! 2. Cross-site pattern whose dominant label clears the reuse thresholds (`pattern-reused`)
//! 3. Classifier call with bounded retries (`fresh-call`)
//! 4. Degraded placeholder when every attempt failed (`degraded`)

mod engine;
mod error;
mod result;
pub mod retry;
pub mod site;
mod stats;

pub use engine::{AnalyzeOptions, EngineSettings, InferenceEngine};
pub use error::EngineError;
pub use result::{AnalysisWarning, ConfidenceBand, OverlayItem, PageAnalysis, ScoredSection};
pub use retry::RetryPolicy;
pub use site::site_key_for;
pub use stats::{AnalysisStats, EngineCounters, EngineTotals, RetryEvent};
