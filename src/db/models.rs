use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const CITY_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ForecastOverride {
    pub city: String,
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl ForecastOverride {
    pub fn new(city: String, date: NaiveDate, min_temperature: f64, max_temperature: f64) -> Self {
        Self {
            city,
            date,
            min_temperature,
            max_temperature,
        }
    }
}

impl std::fmt::Display for ForecastOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): min={}, max={}",
            self.city, self.date, self.min_temperature, self.max_temperature
        )
    }
}
