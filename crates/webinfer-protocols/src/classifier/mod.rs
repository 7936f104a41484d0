//! Classification protocol definitions.
//!
//! Classifiers adapt an LLM backend (OpenAI, Anthropic, Ollama, ...) to a
//! single `classify(content, context)` capability.

mod parse;
mod prompt;
mod request;
mod traits;

pub use parse::*;
pub use prompt::*;
pub use request::*;
pub use traits::*;
