use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::db::models::ForecastOverride;
use crate::db::{OverrideStore, UpsertOutcome};
use crate::error::DatabaseError;

/// Process-local override store; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOverrideStore {
    records: Arc<RwLock<HashMap<(String, NaiveDate), ForecastOverride>>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn upsert(&self, record: &ForecastOverride) -> Result<UpsertOutcome, DatabaseError> {
        let key = (record.city.clone(), record.date);
        let previous = self.records.write().await.insert(key, record.clone());

        Ok(match previous {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Created,
        })
    }

    async fn find(&self, city: &str, date: NaiveDate) -> Result<Option<ForecastOverride>, DatabaseError> {
        let records = self.records.read().await;
        Ok(records.get(&(city.to_string(), date)).cloned())
    }
}
