//! SQLite-backed forecast record store using sqlx.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

/// Reserved model name under which observed month-to-date values are
/// stored; `run_time` is then the observation time.
pub const OBSERVATION_MODEL: &str = "observed";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to create store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timestamp in store: {0}")]
    BadTimestamp(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One persisted projection row.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub location_id: String,
    pub model: String,
    pub run_time: DateTime<Utc>,
    pub observed_mtd: f64,
    pub forecast_remainder: f64,
    /// Always `observed_mtd + forecast_remainder`, recomputed at write time
    pub total_projection: f64,
    /// True when the forecast horizon ended before the coverage window;
    /// the projection is a known underestimate
    pub is_partial: bool,
}

/// Keyed upsert store for forecast records.
///
/// Writes are last-writer-wins on the (location, model, run_time) triple;
/// re-ingesting identical inputs is a no-op beyond the timestamp.
pub struct ForecastStore {
    pool: SqlitePool,
}

impl ForecastStore {
    /// Open or create the store database at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;
        info!(path = %path.display(), "Opened forecast store");

        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing).
    pub async fn open_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS forecasts (
                location_id TEXT NOT NULL,
                model TEXT NOT NULL,
                run_time TEXT NOT NULL,
                observed_mtd REAL NOT NULL DEFAULT 0,
                forecast_remainder REAL NOT NULL DEFAULT 0,
                total_projection REAL NOT NULL DEFAULT 0,
                is_partial INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (location_id, model, run_time)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_forecasts_loc_model ON forecasts(location_id, model)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Upsert one forecast row, replacing any existing row for the same
    /// (location, model, run_time).
    ///
    /// `total_projection` is recomputed here, never trusted from the
    /// caller, and the remainder is clamped at zero on the way in.
    pub async fn upsert_forecast(
        &self,
        location_id: &str,
        model: &str,
        run_time: DateTime<Utc>,
        observed_mtd: f64,
        forecast_remainder: f64,
        is_partial: bool,
    ) -> Result<()> {
        let remainder = forecast_remainder.max(0.0);
        let total = observed_mtd + remainder;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO forecasts
                (location_id, model, run_time, observed_mtd, forecast_remainder,
                 total_projection, is_partial, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(location_id)
        .bind(model)
        .bind(run_time.to_rfc3339())
        .bind(observed_mtd)
        .bind(remainder)
        .bind(total)
        .bind(is_partial)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            location = location_id,
            model,
            run = %run_time,
            total,
            is_partial,
            "Upserted forecast record"
        );
        Ok(())
    }

    /// Record an observed month-to-date value for a location.
    pub async fn upsert_observation(
        &self,
        location_id: &str,
        observed_at: DateTime<Utc>,
        observed_mtd: f64,
    ) -> Result<()> {
        self.upsert_forecast(
            location_id,
            OBSERVATION_MODEL,
            observed_at,
            observed_mtd,
            0.0,
            false,
        )
        .await
    }

    /// Latest observed month-to-date value for a location; 0.0 when none
    /// has been recorded yet.
    pub async fn latest_observed(&self, location_id: &str) -> Result<f64> {
        let row: Option<(f64,)> = sqlx::query_as(
            r#"
            SELECT observed_mtd FROM forecasts
            WHERE location_id = ? AND model = ?
            ORDER BY run_time DESC LIMIT 1
            "#,
        )
        .bind(location_id)
        .bind(OBSERVATION_MODEL)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(v,)| v).unwrap_or(0.0))
    }

    /// Newest record per (location, model), for downstream consumers.
    pub async fn latest_forecasts(&self) -> Result<Vec<ForecastRecord>> {
        let rows: Vec<(String, String, String, f64, f64, f64, bool)> = sqlx::query_as(
            r#"
            SELECT f.location_id, f.model, f.run_time, f.observed_mtd,
                   f.forecast_remainder, f.total_projection, f.is_partial
            FROM forecasts f
            INNER JOIN (
                SELECT location_id, model, MAX(run_time) AS max_run
                FROM forecasts
                GROUP BY location_id, model
            ) latest ON f.location_id = latest.location_id
                    AND f.model = latest.model
                    AND f.run_time = latest.max_run
            ORDER BY f.location_id, f.model
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(location_id, model, run_time, observed, remainder, total, is_partial)| {
                    let run_time = DateTime::parse_from_rfc3339(&run_time)
                        .map_err(|_| StoreError::BadTimestamp(run_time.clone()))?
                        .with_timezone(&Utc);
                    Ok(ForecastRecord {
                        location_id,
                        model,
                        run_time,
                        observed_mtd: observed,
                        forecast_remainder: remainder,
                        total_projection: total,
                        is_partial,
                    })
                },
            )
            .collect()
    }
}
