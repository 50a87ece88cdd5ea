//! Raw session store
//!
//! In-flight sessions live in one SQLite table, one row per telemetry record.
//! Pressure readings are keyed by `(uuid, sample_index)`; a repeated reading
//! is ignored so stored records stay immutable. Label records carry a NULL
//! index and the latest one wins.
//!
//! The store is written only by the assembler task.

use crate::config::SessionPolicy;
use chrono::Utc;
use pmon_common::models::{PressureSample, RawSession, Reading, TelemetrySample};
use pmon_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

pub struct SessionStore {
    pool: SqlitePool,
    policy: SessionPolicy,
}

impl SessionStore {
    /// Wrap `pool` and create the schema if needed
    pub async fn new(pool: SqlitePool, policy: SessionPolicy) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL,
                sample_index INTEGER,
                value REAL,
                pressure_detected TEXT,
                received_at TEXT NOT NULL,
                UNIQUE(uuid, sample_index)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_raw_samples_uuid ON raw_samples(uuid)")
            .execute(&pool)
            .await?;

        Ok(Self { pool, policy })
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Append a record to its session, creating the session on first record
    pub async fn store_record(&self, sample: &TelemetrySample) -> Result<()> {
        let received_at = Utc::now().to_rfc3339();

        match &sample.reading {
            Reading::Pressure { index, value } => {
                let result = sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO raw_samples
                        (uuid, sample_index, value, pressure_detected, received_at)
                    VALUES (?, ?, ?, NULL, ?)
                    "#,
                )
                .bind(&sample.uuid)
                .bind(*index as i64)
                .bind(*value)
                .bind(&received_at)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    debug!(uuid = %sample.uuid, index, "Duplicate reading ignored");
                }
            }
            Reading::Label { pressure_detected } => {
                sqlx::query(
                    r#"
                    INSERT INTO raw_samples
                        (uuid, sample_index, value, pressure_detected, received_at)
                    VALUES (?, NULL, NULL, ?, ?)
                    "#,
                )
                .bind(&sample.uuid)
                .bind(pressure_detected)
                .bind(&received_at)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(())
    }

    /// Completeness predicate for one session.
    ///
    /// * `last_missing_sample = false`: the session is still receiving data
    ///   and is complete once every expected reading is present.
    /// * `last_missing_sample = true`: a different id has superseded this
    ///   session, so it is judged on what it has; up to
    ///   `max_missing_samples` readings may be absent.
    ///
    /// In evaluation mode the session's label record is also required.
    pub async fn is_session_complete(
        &self,
        uuid: &str,
        last_missing_sample: bool,
        evaluation_mode: bool,
    ) -> Result<bool> {
        let (readings, labels, records): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(DISTINCT CASE WHEN sample_index < ? THEN sample_index END),
                COUNT(pressure_detected),
                COUNT(*)
            FROM raw_samples
            WHERE uuid = ?
            "#,
        )
        .bind(self.policy.expected_samples as i64)
        .bind(uuid)
        .fetch_one(&self.pool)
        .await?;

        if records == 0 {
            return Ok(false);
        }

        if evaluation_mode && labels == 0 {
            debug!(uuid = %uuid, "Session still waiting for its label record");
            return Ok(false);
        }

        let expected = self.policy.expected_samples as i64;
        let required = if last_missing_sample {
            expected - self.policy.max_missing_samples as i64
        } else {
            expected
        };

        debug!(uuid = %uuid, readings, required, last_missing_sample, "Completeness check");
        Ok(readings >= required)
    }

    /// Load every record of a session; `None` when the id is unknown
    pub async fn load_raw_session(&self, uuid: &str) -> Result<Option<RawSession>> {
        let rows: Vec<(Option<i64>, Option<f64>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT sample_index, value, pressure_detected
            FROM raw_samples
            WHERE uuid = ?
            ORDER BY id
            "#,
        )
        .bind(uuid)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut session = RawSession::new(uuid);
        for (sample_index, value, pressure_detected) in rows {
            match (sample_index, value) {
                (Some(index), Some(value)) => session.samples.push(PressureSample {
                    index: index as u32,
                    value,
                }),
                _ => {
                    if pressure_detected.is_some() {
                        session.pressure_detected = pressure_detected;
                    }
                }
            }
        }
        session.samples.sort_by_key(|s| s.index);

        Ok(Some(session))
    }

    /// Remove a session; removing an unknown id is not an error
    pub async fn delete_raw_session(&self, uuid: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM raw_samples WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of sessions currently held
    pub async fn session_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT uuid) FROM raw_samples")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
