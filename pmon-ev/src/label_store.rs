//! Label store
//!
//! One table per label source (`ingestion`, `production`), keyed by uuid. A
//! label arriving twice for the same uuid and source replaces the earlier
//! one and takes a fresh timestamp.
//!
//! A uuid present in both tables forms a pair. Pairs are listed in the order
//! their classifier label arrived; the gate consumes them in that order.

use chrono::{DateTime, SecondsFormat, Utc};
use pmon_common::models::{Label, LabelSource};
use pmon_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Expert and classifier labels for one uuid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelPair {
    pub uuid: String,
    pub label_ingestion: String,
    pub label_production: String,
    /// RFC 3339, UTC
    pub production_timestamp: String,
}

impl LabelPair {
    pub fn is_error(&self) -> bool {
        self.label_ingestion != self.label_production
    }
}

/// Rows removed for one uuid by [`LabelStore::remove_labels`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRemoval<'a> {
    pub uuid: &'a str,
    pub ingestion_removed: u64,
    pub production_removed: u64,
}

impl LabelRemoval<'_> {
    pub fn total(&self) -> u64 {
        self.ingestion_removed + self.production_removed
    }
}

pub struct LabelStore {
    pool: SqlitePool,
}

impl LabelStore {
    /// Wrap `pool` and create both label tables if needed
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        for source in [LabelSource::Ingestion, LabelSource::Production] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    uuid TEXT PRIMARY KEY,
                    label TEXT NOT NULL,
                    label_source TEXT NOT NULL,
                    timestamp TEXT NOT NULL
                )
                "#,
                source.as_str()
            ))
            .execute(&pool)
            .await?;
        }

        Ok(Self { pool })
    }

    /// Store a label stamped with the current time
    pub async fn store_label(&self, label: &Label) -> Result<()> {
        self.store_label_at(label, Utc::now()).await
    }

    /// Store a label with an explicit arrival time
    pub async fn store_label_at(&self, label: &Label, timestamp: DateTime<Utc>) -> Result<()> {
        let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(&format!(
            "INSERT OR REPLACE INTO {} (uuid, label, label_source, timestamp) VALUES (?, ?, ?, ?)",
            label.label_source.as_str()
        ))
        .bind(&label.uuid)
        .bind(&label.label)
        .bind(label.label_source.as_str())
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        debug!(
            uuid = %label.uuid,
            source = %label.label_source,
            "Label stored at {}", timestamp
        );
        Ok(())
    }

    /// Number of uuids labelled by both sources
    pub async fn pair_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ingestion i INNER JOIN production p ON i.uuid = p.uuid",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// All pairs, oldest classifier label first
    pub async fn get_pairs(&self) -> Result<Vec<LabelPair>> {
        let pairs = sqlx::query_as::<_, LabelPair>(
            r#"
            SELECT i.uuid AS uuid,
                   i.label AS label_ingestion,
                   p.label AS label_production,
                   p.timestamp AS production_timestamp
            FROM ingestion i
            INNER JOIN production p ON i.uuid = p.uuid
            ORDER BY p.timestamp ASC, p.rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Retrieved {} label pairs", pairs.len());
        Ok(pairs)
    }

    /// Delete `uuids` from both tables in one transaction.
    ///
    /// A uuid found in neither table is logged and skipped.
    pub async fn remove_labels<'a>(&self, uuids: &'a [String]) -> Result<Vec<LabelRemoval<'a>>> {
        if uuids.is_empty() {
            warn!("No label ids provided for removal");
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut removals = Vec::with_capacity(uuids.len());

        for uuid in uuids {
            let ingestion_removed = sqlx::query("DELETE FROM ingestion WHERE uuid = ?")
                .bind(uuid)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            let production_removed = sqlx::query("DELETE FROM production WHERE uuid = ?")
                .bind(uuid)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            let removal = LabelRemoval {
                uuid,
                ingestion_removed,
                production_removed,
            };
            if removal.total() == 0 {
                warn!(uuid = %uuid, "Label not found in any table");
            }
            removals.push(removal);
        }

        tx.commit().await?;

        info!("Removed {} processed label ids", removals.len());
        Ok(removals)
    }
}
