//! Text rendering for CLI output.

use std::fmt::Write;

use webinfer_config::OverlayConfig;
use webinfer_engine::{ConfidenceBand, PageAnalysis};
use webinfer_protocols::{Inference, Pattern};

pub(crate) fn render_analysis(analysis: &PageAnalysis, bands: &OverlayConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Site: {}  (analysis {})", analysis.site_key, analysis.analysis_id);
    if !analysis.url.is_empty() {
        let _ = writeln!(out, "URL:  {}", analysis.url);
    }
    if analysis.cancelled {
        let _ = writeln!(out, "Analysis was cancelled; unclassified sections are marked degraded.");
    }
    out.push('\n');

    if analysis.items.is_empty() {
        out.push_str("No sections found.\n");
    }
    for item in &analysis.items {
        let inference = &item.inference;
        let _ = writeln!(
            out,
            "{}  {:<20} {:<14}{} {}",
            band_tag(inference.confidence, bands),
            inference.label,
            inference.source.as_str(),
            if inference.provisional { " (provisional)" } else { "" },
            item.section.bounding_region.selector
        );
        let _ = writeln!(out, "    {}", inference.rationale);
        let _ = writeln!(out, "    id {}  signature {}", item.section.id, item.section.structural_signature);
    }

    let stats = &analysis.stats;
    let _ = writeln!(
        out,
        "\n{} sections | {} classifier calls | {} cache hits | {} pattern reuses | {} fresh | {} degraded | {} retries | {}ms",
        stats.sections,
        stats.classifier_calls,
        stats.cache_hits,
        stats.pattern_reuses,
        stats.fresh_calls,
        stats.degraded,
        stats.retries,
        stats.duration_ms
    );

    if !analysis.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &analysis.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
    }
    out
}

pub(crate) fn render_inferences(site_key: &str, inferences: &[Inference], bands: &OverlayConfig) -> String {
    let mut out = String::new();
    if inferences.is_empty() {
        let _ = writeln!(out, "No inferences recorded for {}.", site_key);
        return out;
    }
    let _ = writeln!(out, "{} current inferences for {}:\n", inferences.len(), site_key);
    for inference in inferences {
        let _ = writeln!(
            out,
            "{}  {:<20} {}  {}",
            band_tag(inference.confidence, bands),
            inference.label,
            inference.section_id,
            inference.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

pub(crate) fn render_history(section_id: &str, history: &[Inference]) -> String {
    let mut out = String::new();
    if history.is_empty() {
        let _ = writeln!(out, "No history for section {}.", section_id);
        return out;
    }
    for (i, inference) in history.iter().enumerate() {
        let marker = if i + 1 == history.len() { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {}  {:<20} {:.2}  {}",
            marker,
            inference.timestamp.format("%Y-%m-%d %H:%M:%S"),
            inference.label,
            inference.confidence,
            inference.source
        );
        let _ = writeln!(out, "    {}", inference.rationale);
    }
    out
}

pub(crate) fn render_pattern(signature: &str, pattern: Option<&Pattern>) -> String {
    let mut out = String::new();
    let Some(pattern) = pattern else {
        let _ = writeln!(out, "No pattern recorded for {}.", signature);
        return out;
    };

    let _ = writeln!(out, "Pattern {} ({} samples)", signature, pattern.sample_count());
    if let Some(dominant) = pattern.dominant() {
        let _ = writeln!(
            out,
            "Dominant: {} (aggregate confidence {:.2})",
            dominant.label, dominant.aggregate_confidence
        );
    }
    for (label, stats) in &pattern.labels {
        let _ = writeln!(
            out,
            "  {:<20} weight {:>7.2}  samples {:>4}  mean {:.2}  last seen {}",
            label,
            stats.weight,
            stats.sample_count,
            stats.mean_confidence,
            stats.last_seen.format("%Y-%m-%d")
        );
    }
    out
}

fn band_tag(confidence: f64, bands: &OverlayConfig) -> String {
    format!(
        "[{:<6} {:.2}]",
        ConfidenceBand::of(confidence, bands).as_str(),
        confidence
    )
}
