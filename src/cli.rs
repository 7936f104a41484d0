//! CLI definitions for webinfer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// webinfer CLI.
#[derive(Debug, Parser)]
#[command(name = "webinfer")]
#[command(about = "Semantic section inference for web pages")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.webinfer/config.toml when present)
    #[arg(short, long, global = true, env = "WEBINFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured classifier provider
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Analyze a page from a DOM snapshot (.json) or raw HTML file
    Analyze {
        /// Snapshot or HTML file
        file: PathBuf,

        /// Page URL (overrides the snapshot URL)
        #[arg(long)]
        url: Option<String>,

        /// Explicit site key
        #[arg(long)]
        site: Option<String>,

        /// Ignore cached inferences and patterns
        #[arg(long)]
        fresh: bool,

        /// Confirm pattern-reused sections with fresh classifier calls
        #[arg(long)]
        reverify: bool,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current inferences for a site
    Show {
        /// Site key or page URL
        #[arg(long)]
        site: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the inference history of one section
    History {
        /// Site key or page URL
        #[arg(long)]
        site: String,

        /// Section ID
        #[arg(long)]
        section: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the cross-site pattern for a structural signature
    Pattern {
        /// Structural signature, e.g. `nav>ul>li*`
        signature: String,

        #[arg(long)]
        json: bool,
    },

    /// Forget every inference recorded for a site
    Clear {
        /// Site key or page URL
        #[arg(long)]
        site: String,
    },
}
