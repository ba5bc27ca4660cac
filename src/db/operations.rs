use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::db::models::ForecastOverride;
use crate::db::{OverrideStore, UpsertOutcome};
use crate::error::DatabaseError;

pub struct PgOverrideStore {
    pool: Arc<PgPool>,
}

impl PgOverrideStore {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl OverrideStore for PgOverrideStore {
    async fn upsert(&self, record: &ForecastOverride) -> Result<UpsertOutcome, DatabaseError> {
        // xmax is zero only for a freshly inserted row version.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO forecast_overrides (city, date, min_temperature, max_temperature)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (city, date) DO UPDATE
            SET min_temperature = EXCLUDED.min_temperature,
                max_temperature = EXCLUDED.max_temperature,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&record.city)
        .bind(record.date)
        .bind(record.min_temperature)
        .bind(record.max_temperature)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Replaced
        })
    }

    async fn find(&self, city: &str, date: NaiveDate) -> Result<Option<ForecastOverride>, DatabaseError> {
        let record = sqlx::query_as::<_, ForecastOverride>(
            "SELECT city, date, min_temperature, max_temperature FROM forecast_overrides WHERE city = $1 AND date = $2",
        )
        .bind(city)
        .bind(date)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }
}
