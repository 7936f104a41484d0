//! OpenAI-compatible section classifier for webinfer.
//!
//! Also serves Groq and any other endpoint speaking the chat completions API.

mod api;
mod http;
mod provider;

pub use provider::{GROQ_API_URL, OpenAIClassifier};
