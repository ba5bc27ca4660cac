//! Remote weather provider access.
//!
//! Handlers only see the [`WeatherProvider`] trait; the concrete client for
//! weatherapi.com lives in [`weatherapi`].

pub mod weatherapi;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub use weatherapi::WeatherApiClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    /// Local time at the location, `HH:MM`.
    pub local_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub min_temperature: f64,
    pub max_temperature: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ProviderError>;

    /// Forecast for `city` on exactly `date`.
    async fn forecast(&self, city: &str, date: NaiveDate) -> Result<Forecast, ProviderError>;
}
