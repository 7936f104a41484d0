//! Local Ollama section classifier for webinfer.

mod provider;

pub use provider::OllamaClassifier;
