use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, ProviderError};
use super::{CurrentWeather, Forecast, WeatherProvider};

const DEFAULT_LOCAL_TIME: &str = "00:00";

/// How a provider error code is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorClass {
    LocationNotFound,
    RateLimited,
    Credentials,
}

/// Known weatherapi.com error codes. Codes not listed are reported as a
/// generic service failure.
const PROVIDER_ERROR_CODES: &[(i64, ErrorClass)] = &[
    (1002, ErrorClass::Credentials),
    (1006, ErrorClass::LocationNotFound),
    (2006, ErrorClass::Credentials),
    (2007, ErrorClass::RateLimited),
    (2008, ErrorClass::RateLimited),
];

fn error_class(code: i64) -> Option<ErrorClass> {
    PROVIDER_ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, class)| *class)
}

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    base_url: Url,
    api_key: String,
    forecast_days: u32,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        forecast_days: u32,
    ) -> Result<Self, AppError> {
        // `Url::join` drops the last path segment unless it ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::ConfigError(format!("Invalid provider base URL: {}", e)))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key,
            forecast_days,
            http,
        })
    }

    /// Builds a client whose forecast request covers today plus the whole
    /// configured window.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let forecast_days = u32::try_from(settings.forecast.window_days + 1)
            .map_err(|_| AppError::ConfigError("forecast.window_days must not be negative".into()))?;

        Self::new(
            &settings.provider.base_url,
            settings.provider.api_key.clone(),
            Duration::from_secs(settings.provider.timeout_secs),
            forecast_days,
        )
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        city: &str,
    ) -> Result<T, ProviderError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ProviderError::ExternalService(format!("Invalid endpoint: {}", e)))?;

        let response = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status, &body, city);
        warn!("Provider call to {} failed with {}: {}", endpoint, status, err);
        Err(err)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<i64>,
    message: Option<String>,
}

fn classify_failure(status: StatusCode, body: &str, city: &str) -> ProviderError {
    let detail = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error,
        Err(_) => {
            return ProviderError::ExternalService(format!("API responded with status {}", status))
        }
    };

    let code = match detail.code {
        Some(code) => code,
        None => {
            return ProviderError::ExternalService(format!("API responded with status {}", status))
        }
    };

    match error_class(code) {
        Some(ErrorClass::LocationNotFound) => ProviderError::CityNotFound(city.to_string()),
        Some(ErrorClass::RateLimited) => {
            ProviderError::ExternalService("API rate limit exceeded".to_string())
        }
        Some(ErrorClass::Credentials) => {
            ProviderError::ExternalService("API credentials rejected".to_string())
        }
        None => ProviderError::ExternalService(format!(
            "API error {}: {}",
            code,
            detail.message.as_deref().unwrap_or("Unknown error")
        )),
    }
}

/// Extracts `HH:MM` from a `yyyy-MM-dd H:mm` timestamp.
fn clock_time(localtime: Option<&str>) -> String {
    localtime
        .and_then(|value| value.split_whitespace().nth(1))
        .and_then(|time| {
            NaiveTime::parse_from_str(time, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
                .ok()
        })
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|| DEFAULT_LOCAL_TIME.to_string())
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    location: Location,
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Location {
    localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: ForecastDays,
}

#[derive(Debug, Deserialize)]
struct ForecastDays {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: NaiveDate,
    day: DaySummary,
}

#[derive(Debug, Deserialize)]
struct DaySummary {
    mintemp_c: f64,
    maxtemp_c: f64,
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        info!("Requesting current weather for {}", city);
        let data: CurrentResponse = self
            .request("current.json", &[("q", city.to_string())], city)
            .await?;

        Ok(CurrentWeather {
            temperature: data.current.temp_c,
            local_time: clock_time(data.location.localtime.as_deref()),
        })
    }

    async fn forecast(&self, city: &str, date: NaiveDate) -> Result<Forecast, ProviderError> {
        info!("Requesting {}-day forecast for {}", self.forecast_days, city);
        let data: ForecastResponse = self
            .request(
                "forecast.json",
                &[("q", city.to_string()), ("days", self.forecast_days.to_string())],
                city,
            )
            .await?;

        data.forecast
            .forecastday
            .into_iter()
            .find(|day| day.date == date)
            .map(|day| Forecast {
                min_temperature: day.day.mintemp_c,
                max_temperature: day.day.maxtemp_c,
            })
            .ok_or_else(|| {
                ProviderError::ForecastNotFound(format!(
                    "No forecast for {}. Max forecast period is {} days.",
                    date.format("%d.%m.%Y"),
                    self.forecast_days.saturating_sub(1)
                ))
            })
    }
}
