use crate::config::DatabaseConfig;
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection pool supporting SQLite and PostgreSQL
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// A stored endpoint payload
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: i64,
    pub miner: String,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
    pub payload: Value,
}

/// Store statistics for monitoring
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub snapshot_count: i64,
    pub miner_count: i64,
}

/// Persists raw endpoint payloads keyed by miner and endpoint name.
///
/// Every fetch appends a row, so the table doubles as a history of the
/// fleet; `latest` serves the cache-fallback path and `history` the
/// monitoring one.
pub struct SnapshotStore {
    pool: DatabasePool,
}

impl SnapshotStore {
    /// Connect to the database named by the config and create the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = if config.url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?;
            DatabasePool::Sqlite(pool)
        } else {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.url)
                .await?;
            DatabasePool::Postgres(pool)
        };

        let store = Self { pool };
        store.init_schema().await?;
        info!(url = %config.url, "Snapshot store ready");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS snapshots (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        miner TEXT NOT NULL,
                        endpoint TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        payload TEXT NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await?;
                sqlx::query(
                    "CREATE INDEX IF NOT EXISTS idx_snapshots_lookup \
                     ON snapshots (miner, endpoint, created_at)",
                )
                .execute(pool)
                .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS snapshots (
                        id BIGSERIAL PRIMARY KEY,
                        miner TEXT NOT NULL,
                        endpoint TEXT NOT NULL,
                        created_at TIMESTAMPTZ NOT NULL,
                        payload TEXT NOT NULL
                    )
                    "#,
                )
                .execute(pool)
                .await?;
                sqlx::query(
                    "CREATE INDEX IF NOT EXISTS idx_snapshots_lookup \
                     ON snapshots (miner, endpoint, created_at)",
                )
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Append a snapshot for a miner's endpoint
    pub async fn insert(&self, miner: &str, endpoint: &str, payload: &Value) -> Result<()> {
        let created_at = Utc::now();
        let body = serde_json::to_string(payload)?;

        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    "INSERT INTO snapshots (miner, endpoint, created_at, payload) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(miner)
                .bind(endpoint)
                .bind(created_at.to_rfc3339())
                .bind(&body)
                .execute(pool)
                .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO snapshots (miner, endpoint, created_at, payload) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(miner)
                .bind(endpoint)
                .bind(created_at)
                .bind(&body)
                .execute(pool)
                .await?;
            }
        }

        debug!(miner, endpoint, "Stored snapshot");
        Ok(())
    }

    /// Latest snapshot for a miner's endpoint, if any
    pub async fn latest(&self, miner: &str, endpoint: &str) -> Result<Option<Snapshot>> {
        let row = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    "SELECT id, miner, endpoint, created_at, payload FROM snapshots \
                     WHERE miner = ? AND endpoint = ? \
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                )
                .bind(miner)
                .bind(endpoint)
                .fetch_optional(pool)
                .await?
                .map(Self::sqlite_row_to_snapshot)
                .transpose()?
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    "SELECT id, miner, endpoint, created_at, payload FROM snapshots \
                     WHERE miner = $1 AND endpoint = $2 \
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                )
                .bind(miner)
                .bind(endpoint)
                .fetch_optional(pool)
                .await?
                .map(Self::postgres_row_to_snapshot)
                .transpose()?
            }
        };
        Ok(row)
    }

    /// Most recent snapshots for a miner's endpoint, newest first
    pub async fn history(&self, miner: &str, endpoint: &str, limit: i64) -> Result<Vec<Snapshot>> {
        let snapshots = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let rows = sqlx::query(
                    "SELECT id, miner, endpoint, created_at, payload FROM snapshots \
                     WHERE miner = ? AND endpoint = ? \
                     ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(miner)
                .bind(endpoint)
                .bind(limit)
                .fetch_all(pool)
                .await?;
                rows.into_iter()
                    .map(Self::sqlite_row_to_snapshot)
                    .collect::<Result<Vec<_>>>()?
            }
            DatabasePool::Postgres(pool) => {
                let rows = sqlx::query(
                    "SELECT id, miner, endpoint, created_at, payload FROM snapshots \
                     WHERE miner = $1 AND endpoint = $2 \
                     ORDER BY created_at DESC, id DESC LIMIT $3",
                )
                .bind(miner)
                .bind(endpoint)
                .bind(limit)
                .fetch_all(pool)
                .await?;
                rows.into_iter()
                    .map(Self::postgres_row_to_snapshot)
                    .collect::<Result<Vec<_>>>()?
            }
        };
        Ok(snapshots)
    }

    /// Delete all snapshots for a miner, returning the number removed
    pub async fn purge_miner(&self, miner: &str) -> Result<u64> {
        let deleted = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM snapshots WHERE miner = ?")
                    .bind(miner)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM snapshots WHERE miner = $1")
                    .bind(miner)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
        };
        if deleted > 0 {
            info!(miner, deleted, "Purged snapshots");
        }
        Ok(deleted)
    }

    /// Row and distinct miner counts
    pub async fn stats(&self) -> Result<StoreStats> {
        let (snapshot_count, miner_count) = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query(
                    "SELECT COUNT(*) AS snapshot_count, COUNT(DISTINCT miner) AS miner_count \
                     FROM snapshots",
                )
                .fetch_one(pool)
                .await?;
                (row.try_get("snapshot_count")?, row.try_get("miner_count")?)
            }
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    "SELECT COUNT(*) AS snapshot_count, COUNT(DISTINCT miner) AS miner_count \
                     FROM snapshots",
                )
                .fetch_one(pool)
                .await?;
                (row.try_get("snapshot_count")?, row.try_get("miner_count")?)
            }
        };
        Ok(StoreStats {
            snapshot_count,
            miner_count,
        })
    }

    /// Check database connectivity
    pub async fn health_check(&self) -> Result<()> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    fn sqlite_row_to_snapshot(row: sqlx::sqlite::SqliteRow) -> Result<Snapshot> {
        let created_at: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| crate::Error::Api(format!("Invalid stored timestamp: {}", e)))?
            .with_timezone(&Utc);
        let payload: String = row.try_get("payload")?;
        Ok(Snapshot {
            id: row.try_get("id")?,
            miner: row.try_get("miner")?,
            endpoint: row.try_get("endpoint")?,
            created_at,
            payload: serde_json::from_str(&payload)?,
        })
    }

    fn postgres_row_to_snapshot(row: sqlx::postgres::PgRow) -> Result<Snapshot> {
        let payload: String = row.try_get("payload")?;
        Ok(Snapshot {
            id: row.try_get("id")?,
            miner: row.try_get("miner")?,
            endpoint: row.try_get("endpoint")?,
            created_at: row.try_get("created_at")?,
            payload: serde_json::from_str(&payload)?,
        })
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.pool {
            DatabasePool::Sqlite(_) => "sqlite",
            DatabasePool::Postgres(_) => "postgres",
        };
        f.debug_struct("SnapshotStore").field("backend", &backend).finish()
    }
}
