//! Mapping between table rows and protocol types.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use webinfer_protocols::{
    FailureCategory, Inference, InferenceSource, LabelStats, Pattern, StoreError,
};

/// Columns selected for an inference, in [`InferenceRow::from_row`] order.
pub(crate) const INFERENCE_COLUMNS: &str = "section_id, label, confidence, rationale, source, \
     provisional, content_hash, structural_signature, failure, timestamp";

/// Raw inference columns, decoded outside the connection thread.
pub(crate) struct InferenceRow {
    section_id: String,
    label: String,
    confidence: f64,
    rationale: String,
    source: String,
    provisional: bool,
    content_hash: String,
    structural_signature: String,
    failure: Option<String>,
    timestamp: String,
}

impl InferenceRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            section_id: row.get(0)?,
            label: row.get(1)?,
            confidence: row.get(2)?,
            rationale: row.get(3)?,
            source: row.get(4)?,
            provisional: row.get(5)?,
            content_hash: row.get(6)?,
            structural_signature: row.get(7)?,
            failure: row.get(8)?,
            timestamp: row.get(9)?,
        })
    }

    pub(crate) fn into_inference(self) -> Result<Inference, StoreError> {
        let source: InferenceSource = self.source.parse().map_err(StoreError::InvalidRecord)?;
        let failure = self
            .failure
            .map(|f| f.parse::<FailureCategory>())
            .transpose()
            .map_err(StoreError::InvalidRecord)?;

        Ok(Inference {
            section_id: self.section_id,
            label: self.label,
            confidence: self.confidence,
            rationale: self.rationale,
            source,
            timestamp: parse_timestamp(&self.timestamp)?,
            content_hash: self.content_hash,
            structural_signature: self.structural_signature,
            provisional: self.provisional,
            failure,
        })
    }
}

/// Raw `pattern_labels` columns.
pub(crate) struct LabelRow {
    pub label: String,
    pub weight: f64,
    pub sample_count: i64,
    pub updated_at: String,
}

impl LabelRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            label: row.get(0)?,
            weight: row.get(1)?,
            sample_count: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

/// Rebuild a pattern from its label rows. `None` when there are no rows.
pub(crate) fn pattern_from_rows(
    structural_signature: &str,
    rows: Vec<LabelRow>,
) -> Result<Option<Pattern>, StoreError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut labels = BTreeMap::new();
    let mut updated_at: Option<DateTime<Utc>> = None;
    for row in rows {
        let last_seen = parse_timestamp(&row.updated_at)?;
        let sample_count = u64::try_from(row.sample_count).map_err(|_| {
            StoreError::InvalidRecord(format!("negative sample_count for '{}'", row.label))
        })?;
        let mean_confidence = if sample_count > 0 {
            row.weight / sample_count as f64
        } else {
            0.0
        };
        updated_at = Some(updated_at.map_or(last_seen, |u| u.max(last_seen)));
        labels.insert(
            row.label,
            LabelStats {
                weight: row.weight,
                sample_count,
                mean_confidence,
                last_seen,
            },
        );
    }

    Ok(Some(Pattern {
        structural_signature: structural_signature.to_string(),
        labels,
        updated_at: updated_at.unwrap_or_else(Utc::now),
    }))
}

/// Fixed-width UTC timestamps, so text ordering matches time ordering.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRecord(format!("bad timestamp '{}': {}", value, e)))
}
