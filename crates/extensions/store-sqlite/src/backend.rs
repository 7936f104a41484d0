//! SQLite knowledge store implementation.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension, TransactionBehavior, params};
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use webinfer_protocols::{Inference, KnowledgeStore, Pattern, StoreError};

use crate::rows::{
    INFERENCE_COLUMNS, InferenceRow, LabelRow, format_timestamp, pattern_from_rows,
};
use crate::schema::init_schema;

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;

/// Write attempts after the first when another connection holds the lock.
const MAX_CONFLICT_RETRIES: u32 = 5;
const CONFLICT_BASE_DELAY: Duration = Duration::from_millis(20);
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// SQLite-based knowledge store.
pub struct SqliteKnowledgeStore {
    conn: Connection,
}

impl SqliteKnowledgeStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(map_call_error)?;

        Ok(Self { conn })
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            Ok(init_schema(conn)?)
        })
        .await
        .map_err(map_call_error)?;

        Ok(Self { conn })
    }

    /// Run a write, retrying while another connection holds the database lock.
    async fn with_conflict_retry<T, F, Fut>(&self, op: &str, mut write: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match write().await {
                Err(e) if e.is_transient() && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    let delay = CONFLICT_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!(op, attempt, ?delay, error = %e, "Store write conflict, retrying");
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn map_call_error(e: tokio_rusqlite::Error) -> StoreError {
    match &e {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _))
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            StoreError::Conflict(e.to_string())
        }
        tokio_rusqlite::Error::ConnectionClosed => StoreError::ConnectionError(e.to_string()),
        _ => StoreError::QueryError(e.to_string()),
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn get_current(
        &self,
        site_key: &str,
        section_id: &str,
    ) -> Result<Option<Inference>, StoreError> {
        let site_key = site_key.to_string();
        let section_id = section_id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {INFERENCE_COLUMNS} FROM inferences
                     WHERE site_key = ?1 AND section_id = ?2 AND is_current = 1"
                );
                let row = conn
                    .query_row(&sql, params![site_key, section_id], InferenceRow::from_row)
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(map_call_error)?;

        row.map(InferenceRow::into_inference).transpose()
    }

    async fn upsert(&self, site_key: &str, inference: Inference) -> Result<(), StoreError> {
        self.with_conflict_retry("upsert", || {
            let site_key = site_key.to_string();
            let inference = inference.clone();
            async move {
                self.conn
                    .call(move |conn| {
                        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                        tx.execute(
                            "UPDATE inferences SET is_current = 0
                             WHERE site_key = ?1 AND section_id = ?2 AND is_current = 1",
                            params![site_key, inference.section_id],
                        )?;

                        tx.execute(
                            "INSERT INTO inferences (site_key, section_id, label, confidence,
                             rationale, source, provisional, content_hash, structural_signature,
                             failure, timestamp, is_current)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)",
                            params![
                                site_key,
                                inference.section_id,
                                inference.label,
                                inference.confidence,
                                inference.rationale,
                                inference.source.as_str(),
                                inference.provisional,
                                inference.content_hash,
                                inference.structural_signature,
                                inference.failure.map(|f| f.as_str()),
                                format_timestamp(inference.timestamp),
                            ],
                        )?;

                        tx.commit()?;
                        Ok(())
                    })
                    .await
                    .map_err(map_call_error)
            }
        })
        .await?;

        debug!(site_key, section_id = %inference.section_id, "Upserted inference");
        Ok(())
    }

    async fn get_pattern(&self, structural_signature: &str) -> Result<Option<Pattern>, StoreError> {
        let signature = structural_signature.to_string();
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT label, weight, sample_count, updated_at
                     FROM pattern_labels WHERE structural_signature = ?1",
                )?;
                let rows = stmt
                    .query_map([&signature], LabelRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_call_error)?;

        pattern_from_rows(structural_signature, rows)
    }

    async fn update_pattern(
        &self,
        structural_signature: &str,
        label: &str,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<Pattern, StoreError> {
        let pattern = self
            .with_conflict_retry("update_pattern", || {
                let signature = structural_signature.to_string();
                let label = label.to_string();
                async move {
                    let rows_signature = signature.clone();
                    let rows = self
                        .conn
                        .call(move |conn| {
                            let tx =
                                conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                            let rows = {
                                let mut stmt = tx.prepare(
                                    "SELECT label, weight, sample_count, updated_at
                                     FROM pattern_labels WHERE structural_signature = ?1",
                                )?;
                                stmt.query_map([&signature], LabelRow::from_row)?
                                    .collect::<Result<Vec<_>, _>>()?
                            };

                            // Shares shift for every label, so all rows are rewritten.
                            let mut rows = rows;
                            let clamped = confidence.clamp(0.0, 1.0);
                            let now = format_timestamp(at);
                            match rows.iter_mut().find(|r| r.label == label) {
                                Some(row) => {
                                    row.weight += clamped;
                                    row.sample_count += 1;
                                    if row.updated_at < now {
                                        row.updated_at = now.clone();
                                    }
                                }
                                None => rows.push(LabelRow {
                                    label: label.clone(),
                                    weight: clamped,
                                    sample_count: 1,
                                    updated_at: now.clone(),
                                }),
                            }

                            let total: f64 = rows.iter().map(|r| r.weight).sum();
                            for row in &rows {
                                let mean = row.weight / row.sample_count.max(1) as f64;
                                let share = if total > 0.0 { row.weight / total } else { 0.0 };
                                tx.execute(
                                    "INSERT INTO pattern_labels (structural_signature, label,
                                     weight, aggregate_confidence, sample_count, updated_at)
                                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                                     ON CONFLICT (structural_signature, label) DO UPDATE SET
                                     weight = excluded.weight,
                                     aggregate_confidence = excluded.aggregate_confidence,
                                     sample_count = excluded.sample_count,
                                     updated_at = excluded.updated_at",
                                    params![
                                        signature,
                                        row.label,
                                        row.weight,
                                        mean * share,
                                        row.sample_count,
                                        row.updated_at,
                                    ],
                                )?;
                            }

                            tx.commit()?;
                            Ok(rows)
                        })
                        .await
                        .map_err(map_call_error)?;

                    pattern_from_rows(&rows_signature, rows)?.ok_or_else(|| {
                        StoreError::InvalidRecord(format!(
                            "pattern '{}' missing after update",
                            rows_signature
                        ))
                    })
                }
            })
            .await?;

        debug!(
            signature = structural_signature,
            label,
            samples = pattern.sample_count(),
            "Updated pattern"
        );
        Ok(pattern)
    }

    async fn history(
        &self,
        site_key: &str,
        section_id: &str,
    ) -> Result<Vec<Inference>, StoreError> {
        let site_key = site_key.to_string();
        let section_id = section_id.to_string();
        let rows = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {INFERENCE_COLUMNS} FROM inferences
                     WHERE site_key = ?1 AND section_id = ?2 ORDER BY id ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![site_key, section_id], InferenceRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_call_error)?;

        rows.into_iter().map(InferenceRow::into_inference).collect()
    }

    async fn site_inferences(&self, site_key: &str) -> Result<Vec<Inference>, StoreError> {
        let site_key = site_key.to_string();
        let rows = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {INFERENCE_COLUMNS} FROM inferences
                     WHERE site_key = ?1 AND is_current = 1 ORDER BY id ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([&site_key], InferenceRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_call_error)?;

        rows.into_iter().map(InferenceRow::into_inference).collect()
    }

    async fn clear_site(&self, site_key: &str) -> Result<usize, StoreError> {
        let removed = self
            .with_conflict_retry("clear_site", || {
                let site_key = site_key.to_string();
                async move {
                    self.conn
                        .call(move |conn| {
                            Ok(conn.execute("DELETE FROM inferences WHERE site_key = ?1", [&site_key])?)
                        })
                        .await
                        .map_err(map_call_error)
                }
            })
            .await?;

        debug!(site_key, removed, "Cleared site knowledge");
        Ok(removed)
    }
}
