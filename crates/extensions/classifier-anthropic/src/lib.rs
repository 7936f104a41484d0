//! Anthropic Messages API section classifier for webinfer.

mod api;
mod provider;

pub use provider::AnthropicClassifier;
