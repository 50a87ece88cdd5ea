//! Record timestamp log
//!
//! Every stage may report when a record passed through it (`POST /log`); the
//! relay itself logs each record it forwards to ingestion. Entries are
//! appended, never updated, and written by a single consumer task.
//!
//! An entry for [`ALL_RECORDS`] is a broadcast: it appends one entry per
//! record already tracked.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use pmon_common::{Error, QueueMessage, QueueReceiver, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Source name the relay logs its own forwards under
pub const INPUT_SYSTEM: &str = "input_system";

/// Record id that stamps every tracked record
pub const ALL_RECORDS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimestampEntry {
    pub record_id: String,
    pub system_source: String,
    /// ISO 8601 as reported; RFC 3339 UTC when stamped by the relay
    pub timestamp: String,
}

impl TimestampEntry {
    /// Entry stamped with the current time
    pub fn now(record_id: impl Into<String>, system_source: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            system_source: system_source.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Body of `POST /log`
#[derive(Debug, Clone, Deserialize)]
pub struct LogPayload {
    pub uuid: String,
    pub system_source: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl LogPayload {
    /// Check the payload and stamp it with the current time if it has none
    pub fn into_entry(self) -> Result<TimestampEntry> {
        if self.uuid.trim().is_empty() {
            return Err(Error::InvalidInput("uuid must not be empty".to_string()));
        }
        if self.system_source.trim().is_empty() {
            return Err(Error::InvalidInput("system_source must not be empty".to_string()));
        }

        match self.timestamp {
            None => Ok(TimestampEntry::now(self.uuid, self.system_source)),
            Some(timestamp) if is_iso_timestamp(&timestamp) => Ok(TimestampEntry {
                record_id: self.uuid,
                system_source: self.system_source,
                timestamp,
            }),
            Some(timestamp) => Err(Error::InvalidInput(format!(
                "timestamp is not ISO 8601: {}",
                timestamp
            ))),
        }
    }
}

/// RFC 3339, or a local date-time without offset
fn is_iso_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

pub struct TimestampStore {
    pool: SqlitePool,
}

impl TimestampStore {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS record_timestamps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id TEXT NOT NULL,
                system_source TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_record_timestamps_record ON record_timestamps(record_id)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Append `entry`, or fan it out to every tracked record for [`ALL_RECORDS`].
    ///
    /// Returns the number of entries written.
    pub async fn append(&self, entry: &TimestampEntry) -> Result<u64> {
        if entry.record_id == ALL_RECORDS {
            return self.append_to_all(entry).await;
        }

        sqlx::query(
            "INSERT INTO record_timestamps (record_id, system_source, timestamp) VALUES (?, ?, ?)",
        )
        .bind(&entry.record_id)
        .bind(&entry.system_source)
        .bind(&entry.timestamp)
        .execute(&self.pool)
        .await?;

        debug!(record_id = %entry.record_id, source = %entry.system_source, "Timestamp logged");
        Ok(1)
    }

    async fn append_to_all(&self, entry: &TimestampEntry) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO record_timestamps (record_id, system_source, timestamp)
            SELECT record_id, ?, ?
            FROM (SELECT record_id, MIN(id) AS first_id FROM record_timestamps GROUP BY record_id)
            ORDER BY first_id
            "#,
        )
        .bind(&entry.system_source)
        .bind(&entry.timestamp)
        .execute(&self.pool)
        .await?;

        let written = result.rows_affected();
        info!(source = %entry.system_source, records = written, "Timestamp logged for all records");
        Ok(written)
    }

    /// Entries for one record, in arrival order
    pub async fn entries_for(&self, record_id: &str) -> Result<Vec<TimestampEntry>> {
        let entries = sqlx::query_as::<_, TimestampEntry>(
            r#"
            SELECT record_id, system_source, timestamp
            FROM record_timestamps
            WHERE record_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM record_timestamps")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Drain the timestamp queue into `store` until every producer is gone
pub async fn run_writer(store: TimestampStore, mut queue: QueueReceiver<TimestampEntry>) {
    info!("Timestamp writer started");

    while let Some(message) = queue.next().await {
        match message {
            QueueMessage::Start => info!("Received start signal"),
            QueueMessage::Item(entry) => {
                if let Err(e) = store.append(&entry).await {
                    error!(record_id = %entry.record_id, "Failed to log timestamp: {}", e);
                }
            }
        }
    }

    info!("Timestamp queue closed, writer stopping");
}
