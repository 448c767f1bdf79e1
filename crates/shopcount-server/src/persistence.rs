//! SQLite storage for branches and count records
//!
//! Timestamps are stored as branch-local wall-clock text
//! (`YYYY-MM-DD HH:MM:SS[.fff]`), which keeps lexical and chronological
//! order identical so range filters can compare strings directly.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shopcount_common::{BranchId, BranchInfo, CountRecord, DateRange, Result, ShopCountError};
use shopcount_reports::CountRecordStore;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Database schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Text layout of stored timestamps
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Count record store backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteCountStore {
    pool: SqlitePool,
}

impl SqliteCountStore {
    /// Connects to `url` and makes sure the schema exists.
    ///
    /// File databases get their parent directory created first. In-memory
    /// databases should use a single connection, since every connection
    /// opens its own database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!(%url, max_connections, "Connecting to count database");
        ensure_parent_dir(url)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                ShopCountError::database_with_source(format!("Failed to connect to database: {url}"), e)
            })?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, initializing the schema.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(schema_error)?;

        let current_version: Option<i32> =
            sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(schema_error)?;

        if let Some(version) = current_version.filter(|v| *v >= SCHEMA_VERSION) {
            debug!(version, "Database schema is up to date");
            return Ok(());
        }
        info!(version = SCHEMA_VERSION, "Creating database schema");

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS branches (
                branch_id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(schema_error)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS customer_counts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                camera_id TEXT,
                branch_id TEXT NOT NULL,
                timestamp TEXT,
                entry_count INTEGER NOT NULL DEFAULT 0,
                exit_count INTEGER NOT NULL DEFAULT 0,
                current_count INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(schema_error)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_customer_counts_branch_time ON customer_counts(branch_id, timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(schema_error)?;

        sqlx::query("INSERT OR REPLACE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&self.pool)
            .await
            .map_err(schema_error)?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Registers a branch or renames an existing one.
    #[instrument(skip(self, branch), fields(branch = %branch.branch_id))]
    pub async fn upsert_branch(&self, branch: &BranchInfo) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO branches (branch_id, name) VALUES (?, ?)
            ON CONFLICT(branch_id) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(branch.branch_id.as_str())
        .bind(&branch.name)
        .execute(&self.pool)
        .await
        .map_err(|e| ShopCountError::database_with_source("Failed to save branch", e))?;

        debug!(name = %branch.name, "Saved branch");
        Ok(())
    }

    /// Stores `records` in one transaction and returns how many were written.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_records(&self, records: &[CountRecord]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShopCountError::database_with_source("Failed to start transaction", e))?;

        let mut written = 0;
        for record in records {
            let result = sqlx::query(
                r"
                INSERT INTO customer_counts (
                    camera_id, branch_id, timestamp, entry_count, exit_count, current_count
                ) VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(record.camera_id.as_deref())
            .bind(record.branch_id.as_str())
            .bind(format_stored(record.timestamp))
            .bind(i64::from(record.entry_count))
            .bind(i64::from(record.exit_count))
            .bind(i64::from(record.current_count))
            .execute(&mut *tx)
            .await
            .map_err(|e| ShopCountError::database_with_source("Failed to insert count record", e))?;
            written += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| ShopCountError::database_with_source("Failed to commit count records", e))?;

        info!(written, "Stored count records");
        Ok(written)
    }

    /// Checks that the database answers queries.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ShopCountError::database_with_source("Database is unreachable", e))?;
        Ok(())
    }
}

#[async_trait]
impl CountRecordStore for SqliteCountStore {
    /// Rows of the branch without a timestamp fail the whole fetch instead
    /// of being dropped.
    #[instrument(skip(self, branch_id, range), fields(branch = %branch_id))]
    async fn fetch_records(
        &self,
        branch_id: &BranchId,
        range: &DateRange,
    ) -> Result<Vec<CountRecord>> {
        let rows = sqlx::query(
            r"
            SELECT camera_id, branch_id, timestamp, entry_count, exit_count, current_count
            FROM customer_counts
            WHERE branch_id = ?
              AND (timestamp IS NULL OR (timestamp >= ? AND timestamp < ?))
            ",
        )
        .bind(branch_id.as_str())
        .bind(format_stored(range.start_datetime()))
        .bind(format_stored(range.end_datetime()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopCountError::database_with_source("Failed to fetch count records", e))?;

        let records = rows.iter().map(decode_record).collect::<Result<Vec<_>>>()?;
        debug!(count = records.len(), "Fetched count records");
        Ok(records)
    }

    async fn find_branch(&self, branch_id: &BranchId) -> Result<Option<BranchInfo>> {
        let row = sqlx::query("SELECT branch_id, name FROM branches WHERE branch_id = ?")
            .bind(branch_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShopCountError::database_with_source("Failed to look up branch", e))?;

        row.map(|row| -> Result<BranchInfo> {
            Ok(BranchInfo::new(
                column::<String>(&row, "branch_id")?,
                column::<String>(&row, "name")?,
            ))
        })
        .transpose()
    }

    /// Latest means most recently stored, i.e. the highest row id per camera.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    async fn latest_per_camera(&self, branch_id: &BranchId) -> Result<Vec<CountRecord>> {
        let rows = sqlx::query(
            r"
            SELECT c.camera_id, c.branch_id, c.timestamp, c.entry_count, c.exit_count, c.current_count
            FROM customer_counts c
            JOIN (
                SELECT MAX(id) AS latest_id
                FROM customer_counts
                WHERE branch_id = ?
                GROUP BY camera_id
            ) latest ON c.id = latest.latest_id
            ",
        )
        .bind(branch_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopCountError::database_with_source("Failed to fetch latest counts", e))?;

        rows.iter().map(decode_record).collect()
    }
}

fn schema_error(e: sqlx::Error) -> ShopCountError {
    ShopCountError::database_with_source("Failed to initialize database schema", e)
}

fn format_stored(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| {
        ShopCountError::database_with_source(format!("Failed to read column '{name}'"), e)
    })
}

fn count_column(row: &SqliteRow, name: &str) -> Result<u32> {
    let value: i64 = column(row, name)?;
    u32::try_from(value).map_err(|_| {
        ShopCountError::database(format!("Stored {name} of {value} is out of range"))
    })
}

fn decode_record(row: &SqliteRow) -> Result<CountRecord> {
    let raw: Option<String> = column(row, "timestamp")?;
    let raw = raw.ok_or_else(|| ShopCountError::database("Stored count record has no timestamp"))?;
    let timestamp = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| {
        ShopCountError::database_with_source(format!("Stored timestamp '{raw}' is malformed"), e)
    })?;

    Ok(CountRecord {
        branch_id: BranchId::from(column::<String>(row, "branch_id")?),
        camera_id: column(row, "camera_id")?,
        timestamp,
        entry_count: count_column(row, "entry_count")?,
        exit_count: count_column(row, "exit_count")?,
        current_count: count_column(row, "current_count")?,
    })
}

/// Creates the directory holding a file database named by `url`.
fn ensure_parent_dir(url: &str) -> Result<()> {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = rest.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
