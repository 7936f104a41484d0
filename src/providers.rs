//! Builds the configured classifier and knowledge store.

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use webinfer_classifier_anthropic::AnthropicClassifier;
use webinfer_classifier_heuristic::HeuristicClassifier;
use webinfer_classifier_ollama::OllamaClassifier;
use webinfer_classifier_openai::{GROQ_API_URL, OpenAIClassifier};
use webinfer_config::{Config, ConfigLoader, ProviderConfig};
use webinfer_protocols::{Classifier, KnowledgeStore};
use webinfer_store_memory::MemoryKnowledgeStore;
use webinfer_store_sqlite::SqliteKnowledgeStore;

const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

pub(crate) fn build_classifier(config: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    let provider = config.classifier.provider.as_str();
    let settings = config.active_provider().cloned().unwrap_or_default();
    let max_tokens = config.classifier.max_tokens;
    let temperature = config.classifier.temperature;

    let classifier: Arc<dyn Classifier> = match provider {
        "openai" => {
            let api_key = api_key(provider, &settings, "OPENAI_API_KEY")?;
            let classifier = match &settings.base_url {
                Some(base) => OpenAIClassifier::with_url(
                    api_key,
                    settings.model.clone(),
                    endpoint(base, "/chat/completions"),
                ),
                None => OpenAIClassifier::new(api_key, settings.model.clone()),
            };
            Arc::new(classifier.with_sampling(max_tokens, temperature))
        }
        "groq" => {
            let api_key = api_key(provider, &settings, "GROQ_API_KEY")?;
            let url = settings
                .base_url
                .as_deref()
                .map(|base| endpoint(base, "/chat/completions"))
                .unwrap_or_else(|| GROQ_API_URL.to_string());
            let model = settings
                .model
                .clone()
                .or_else(|| Some(GROQ_DEFAULT_MODEL.to_string()));
            Arc::new(
                OpenAIClassifier::with_url(api_key, model, url)
                    .with_id("groq")
                    .with_sampling(max_tokens, temperature),
            )
        }
        "anthropic" => {
            let api_key = api_key(provider, &settings, "ANTHROPIC_API_KEY")?;
            let classifier = match &settings.base_url {
                Some(base) => AnthropicClassifier::with_url(
                    api_key,
                    settings.model.clone(),
                    endpoint(base, "/v1/messages"),
                ),
                None => AnthropicClassifier::new(api_key, settings.model.clone()),
            };
            Arc::new(classifier.with_sampling(max_tokens, temperature))
        }
        "ollama" => Arc::new(
            OllamaClassifier::new(settings.base_url.clone(), settings.model.clone())
                .with_sampling(max_tokens, temperature),
        ),
        "heuristic" => Arc::new(HeuristicClassifier::new()),
        other => bail!("Unknown classifier provider '{}'", other),
    };

    info!(
        "Using classifier {} (model {})",
        classifier.id(),
        classifier.model()
    );
    Ok(classifier)
}

pub(crate) async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let path = ConfigLoader::expand_path(&config.store.path);
            let store = SqliteKnowledgeStore::open(&path)
                .await
                .with_context(|| format!("Failed to open knowledge store at {}", path))?;
            info!("Knowledge store: sqlite at {}", path);
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("Knowledge store: in-memory (nothing is persisted)");
            Ok(Arc::new(MemoryKnowledgeStore::new()))
        }
        other => bail!("Unknown store backend '{}'", other),
    }
}

fn api_key(provider: &str, settings: &ProviderConfig, env_var: &str) -> anyhow::Result<String> {
    settings
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
        .with_context(|| {
            format!(
                "No API key for provider '{}': set providers.{}.api_key or {}",
                provider, provider, env_var
            )
        })
}

/// Append `suffix` to a base URL unless it already names the endpoint.
fn endpoint(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(suffix) {
        base.to_string()
    } else {
        format!("{}{}", base, suffix)
    }
}
