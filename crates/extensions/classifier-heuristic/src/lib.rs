//! Offline section classifier.
//!
//! Labels sections from tag, role, class and text markers without calling a
//! model. Useful for demos, tests and air-gapped runs.

mod rules;

pub use rules::HeuristicClassifier;
