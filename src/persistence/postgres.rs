//! PostgreSQL implementation of the WAL catalog.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::WalCatalog;
use crate::config::DatabaseConfig;
use crate::domain::WalSegmentRecord;
use crate::error::PitrError;

/// Insert-or-update with the monotonic-completion guard in the `WHERE`
/// clause. A conflict that fails the guard updates nothing and reports zero
/// affected rows.
const UPSERT_SQL: &str = "\
    INSERT INTO wal_metadata (file_name, timeline_id, segment_hex, is_partial, file_size_bytes, processed) \
    VALUES ($1, $2, $3, $4, $5, FALSE) \
    ON CONFLICT (file_name) DO UPDATE \
    SET segment_hex = EXCLUDED.segment_hex, \
        is_partial = EXCLUDED.is_partial, \
        file_size_bytes = EXCLUDED.file_size_bytes \
    WHERE NOT (wal_metadata.is_partial = FALSE AND EXCLUDED.is_partial = TRUE) \
      AND ((wal_metadata.is_partial = TRUE AND EXCLUDED.is_partial = FALSE) \
           OR wal_metadata.file_size_bytes <> EXCLUDED.file_size_bytes)";

type SegmentRow = (String, i32, String, bool, i64, DateTime<Utc>, bool);

/// PostgreSQL-backed catalog using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Creates a catalog over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Persistence`] if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PitrError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PitrError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PitrError::Persistence(e.to_string()))
    }
}

#[async_trait]
impl WalCatalog for PostgresCatalog {
    async fn upsert(&self, record: &WalSegmentRecord) -> Result<bool, PitrError> {
        let timeline_id = i32::try_from(record.timeline_id).map_err(|_| {
            PitrError::InvalidWalFilename(format!(
                "{}: timeline {} exceeds catalog range",
                record.file_name, record.timeline_id
            ))
        })?;

        let result = sqlx::query(UPSERT_SQL)
            .bind(&record.file_name)
            .bind(timeline_id)
            .bind(&record.segment_hex)
            .bind(record.is_partial)
            .bind(record.file_size_bytes)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_file_names_ascending(&self) -> Result<Vec<String>, PitrError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT file_name FROM wal_metadata ORDER BY file_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn list_segments(&self) -> Result<Vec<WalSegmentRecord>, PitrError> {
        let rows = sqlx::query_as::<_, SegmentRow>(
            "SELECT file_name, timeline_id, segment_hex, is_partial, file_size_bytes, created_at, processed \
             FROM wal_metadata ORDER BY file_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(file_name, timeline_id, segment_hex, is_partial, file_size_bytes, created_at, processed)| {
                    WalSegmentRecord {
                        file_name,
                        timeline_id: u32::try_from(timeline_id).unwrap_or_default(),
                        segment_hex,
                        is_partial,
                        file_size_bytes,
                        created_at,
                        processed,
                    }
                },
            )
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::segment::accepts_update;

    /// Evaluates the `WHERE` clause of [`UPSERT_SQL`] over
    /// `(is_partial, size)` of the stored and incoming rows.
    fn sql_guard(stored: (bool, i64), incoming: (bool, i64)) -> bool {
        !(!stored.0 && incoming.0) && ((stored.0 && !incoming.0) || stored.1 != incoming.1)
    }

    #[test]
    fn upsert_guard_clauses_are_present() {
        let compact: String = UPSERT_SQL.split_whitespace().collect::<Vec<_>>().join(" ");
        for clause in [
            "ON CONFLICT (file_name) DO UPDATE",
            "WHERE NOT (wal_metadata.is_partial = FALSE AND EXCLUDED.is_partial = TRUE)",
            "AND ((wal_metadata.is_partial = TRUE AND EXCLUDED.is_partial = FALSE) \
             OR wal_metadata.file_size_bytes <> EXCLUDED.file_size_bytes)",
        ] {
            assert!(compact.contains(clause), "missing {clause:?} in {compact}");
        }
        assert!(!compact.contains("created_at ="));
        assert!(!compact.contains("processed ="));
    }

    #[test]
    fn upsert_guard_matches_accepts_update() {
        for stored in [(true, 10), (false, 10)] {
            for incoming in [(true, 10), (true, 20), (false, 10), (false, 20)] {
                let existing = WalSegmentRecord::observed("000000010000000000000001", 1, "0000000000000001", stored.0, 10);
                let mut update = existing.clone();
                update.is_partial = incoming.0;
                update.file_size_bytes = incoming.1;
                assert_eq!(
                    sql_guard(stored, incoming),
                    accepts_update(&existing, &update),
                    "stored {stored:?} incoming {incoming:?}"
                );
            }
        }
    }

    /// Runs against a live database named by `DATABASE_URL`.
    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn postgres_upsert_is_monotonic() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            panic!("DATABASE_URL not set");
        };
        let Ok(pool) = PgPool::connect(&url).await else {
            panic!("connect failed");
        };
        let catalog = PostgresCatalog::new(pool);
        assert!(catalog.migrate().await.is_ok());

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let segment_hex = format!("{:016X}", nanos.unsigned_abs());
        let name = format!("000000FF{segment_hex}");
        let cleanup = || {
            sqlx::query("DELETE FROM wal_metadata WHERE file_name = $1")
                .bind(name.clone())
                .execute(&catalog.pool)
        };
        assert!(cleanup().await.is_ok());

        let partial = WalSegmentRecord::observed(name.clone(), 255, segment_hex.clone(), true, 1000);
        let complete = WalSegmentRecord::observed(name.clone(), 255, segment_hex.clone(), false, 16_777_216);

        let outcomes = [
            catalog.upsert(&partial).await,
            catalog.upsert(&partial).await,
            catalog.upsert(&complete).await,
            catalog.upsert(&complete).await,
            catalog.upsert(&partial).await,
        ];
        let changed: Vec<bool> = outcomes
            .into_iter()
            .map(|r| {
                let Ok(changed) = r else {
                    panic!("upsert failed: {r:?}");
                };
                changed
            })
            .collect();
        assert_eq!(changed, vec![true, false, true, false, false]);

        let Ok(rows) = catalog.list_segments().await else {
            panic!("listing failed");
        };
        let Some(row) = rows.iter().find(|r| r.file_name == name) else {
            panic!("row missing");
        };
        assert!(!row.is_partial);
        assert_eq!(row.file_size_bytes, 16_777_216);

        assert!(cleanup().await.is_ok());
    }
}
