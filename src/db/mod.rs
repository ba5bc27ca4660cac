//! Persistence for manual forecast overrides.
//!
//! Records are keyed by (city, date). [`PgOverrideStore`] backs production
//! deployments; [`InMemoryOverrideStore`] honours the same contract without a
//! database.

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DatabaseError;

pub use memory::InMemoryOverrideStore;
pub use models::ForecastOverride;
pub use operations::PgOverrideStore;

/// Whether an upsert inserted a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

impl UpsertOutcome {
    pub fn was_created(self) -> bool {
        matches!(self, UpsertOutcome::Created)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Inserts or replaces the override for `(record.city, record.date)`.
    /// Concurrent writers on the same key resolve as last writer wins.
    async fn upsert(&self, record: &ForecastOverride) -> Result<UpsertOutcome, DatabaseError>;

    async fn find(&self, city: &str, date: NaiveDate) -> Result<Option<ForecastOverride>, DatabaseError>;
}
