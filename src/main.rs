//! webinfer - semantic section inference for web pages.
//!
//! Main entry point for the webinfer CLI.

mod cli;
mod output;
mod providers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use webinfer_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use webinfer_engine::{AnalyzeOptions, InferenceEngine, site_key_for};
use webinfer_extractor::DomSnapshot;
use webinfer_protocols::KnowledgeStore;

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and optional file output.
///
/// Console output goes to stderr so `--json` output stays clean. Log files
/// rotate daily when `logging.directory` is set.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("Invalid log level '{}'", logging.level))?;

    let (json_layer, text_layer) = if logging.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(fmt::layer().with_target(true).with_writer(std::io::stderr)),
        )
    };

    let file_layer = match &logging.directory {
        Some(dir) => {
            let dir = PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy()));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("webinfer")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the writer alive for the whole process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    if let Some(provider) = &cli.provider {
        config.classifier.provider = provider.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging)?;

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if let Some(error) = validation.into_error() {
        return Err(error.into());
    }

    let store = providers::build_store(&config).await?;

    match cli.command {
        Commands::Analyze {
            file,
            url,
            site,
            fresh,
            reverify,
            json,
        } => {
            let request = AnalyzeRequest {
                file,
                url,
                site,
                fresh,
                reverify,
                json,
            };
            run_analyze(&config, store, request).await
        }
        Commands::Show { site, json } => {
            let site_key = resolve_site(&site);
            let inferences = store.site_inferences(&site_key).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&inferences)?);
            } else {
                print!(
                    "{}",
                    output::render_inferences(&site_key, &inferences, &config.overlay)
                );
            }
            Ok(())
        }
        Commands::History {
            site,
            section,
            json,
        } => {
            let site_key = resolve_site(&site);
            let history = store.history(&site_key, &section).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print!("{}", output::render_history(&section, &history));
            }
            Ok(())
        }
        Commands::Pattern { signature, json } => {
            let pattern = store.get_pattern(&signature).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pattern)?);
            } else {
                print!("{}", output::render_pattern(&signature, pattern.as_ref()));
            }
            Ok(())
        }
        Commands::Clear { site } => {
            let site_key = resolve_site(&site);
            let removed = store.clear_site(&site_key).await?;
            println!("Removed {} inference records for {}", removed, site_key);
            Ok(())
        }
    }
}

struct AnalyzeRequest {
    file: PathBuf,
    url: Option<String>,
    site: Option<String>,
    fresh: bool,
    reverify: bool,
    json: bool,
}

async fn run_analyze(
    config: &Config,
    store: Arc<dyn KnowledgeStore>,
    request: AnalyzeRequest,
) -> anyhow::Result<()> {
    let mut snapshot = read_snapshot(
        &request.file,
        request.url.as_deref(),
        config.extraction.max_depth,
    )
    .await?;
    if let Some(url) = request.url {
        snapshot.url = url;
    }

    let site_key = match request.site {
        Some(site) => Some(site),
        None if site_key_for(&snapshot.url).is_err() => Some(local_site_key(&request.file)),
        None => None,
    };

    let classifier = providers::build_classifier(config)?;
    let engine = InferenceEngine::from_config(config, classifier, store);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling analysis");
            trigger.cancel();
        }
    });

    let options = AnalyzeOptions {
        site_key,
        force_fresh: request.fresh,
    };
    let mut analysis = engine.analyze(&snapshot, &options, &cancel).await?;
    if request.reverify && analysis.provisional_count() > 0 && !cancel.is_cancelled() {
        info!(
            "Re-verifying {} provisional sections",
            analysis.provisional_count()
        );
        engine.reverify(&mut analysis, &cancel).await;
    }

    if request.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", output::render_analysis(&analysis, &config.overlay));
    }
    Ok(())
}

/// `.json` files are browser snapshots; anything else is parsed as HTML.
async fn read_snapshot(
    file: &Path,
    url: Option<&str>,
    max_depth: usize,
) -> anyhow::Result<DomSnapshot> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        DomSnapshot::from_json(&content)
            .with_context(|| format!("Invalid DOM snapshot in {}", file.display()))
    } else {
        Ok(DomSnapshot::from_html_with_depth(
            url.unwrap_or_default(),
            &content,
            max_depth,
        ))
    }
}

/// Site key or URL given on the command line.
fn resolve_site(arg: &str) -> String {
    site_key_for(arg).unwrap_or_else(|_| arg.trim().to_lowercase())
}

/// Fallback site key for local files without a usable URL.
fn local_site_key(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "page".to_string());
    format!("local/{}", stem)
}
