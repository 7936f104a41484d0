//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
-- One row per inference ever recorded; is_current marks the live one
CREATE TABLE IF NOT EXISTS inferences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_key TEXT NOT NULL,
    section_id TEXT NOT NULL,
    label TEXT NOT NULL,
    confidence REAL NOT NULL,
    rationale TEXT NOT NULL,
    source TEXT NOT NULL,
    provisional INTEGER NOT NULL DEFAULT 0,
    content_hash TEXT NOT NULL,
    structural_signature TEXT NOT NULL,
    failure TEXT,
    timestamp TEXT NOT NULL,
    is_current INTEGER NOT NULL DEFAULT 1
);

-- At most one current inference per (site, section)
CREATE UNIQUE INDEX IF NOT EXISTS idx_inferences_current
    ON inferences(site_key, section_id) WHERE is_current = 1;

CREATE INDEX IF NOT EXISTS idx_inferences_key ON inferences(site_key, section_id);

-- Per-label evidence for each structural signature
CREATE TABLE IF NOT EXISTS pattern_labels (
    structural_signature TEXT NOT NULL,
    label TEXT NOT NULL,
    weight REAL NOT NULL,
    aggregate_confidence REAL NOT NULL,
    sample_count INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (structural_signature, label)
);
"#;
