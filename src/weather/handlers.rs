use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, FieldErrors};
use crate::provider::Forecast;
use crate::weather::validation::{format_date, validate_forecast_date, ForecastSubmission};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub city: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ForecastOverrideResponse {
    pub city: String,
    pub date: String,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

/// Empty query values count as missing.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn current_weather(
    query: web::Query<CurrentWeatherQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let city = present(query.city.as_deref())
        .ok_or_else(|| AppError::MissingParameter("Parameter 'city' is required".into()))?;

    info!("Received current weather request for city: {}", city);
    match state.provider.current_weather(city).await {
        Ok(weather) => Ok(HttpResponse::Ok().json(weather)),
        Err(e) => {
            warn!("Current weather lookup failed for city: {}: {}", city, e);
            Err(e.into())
        }
    }
}

pub async fn get_forecast(
    query: web::Query<ForecastQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (city, raw_date) = match (present(query.city.as_deref()), present(query.date.as_deref())) {
        (Some(city), Some(date)) => (city, date),
        _ => {
            return Err(AppError::MissingParameter(
                "Parameters 'city' and 'date' are required".into(),
            ))
        }
    };

    let today = state.clock.today();
    let date = validate_forecast_date(raw_date, today, state.config.forecast.window_days)
        .map_err(|e| {
            warn!("Rejected forecast date for city: {}: {:?}", city, e);
            FieldErrors::single("date", e)
        })?;

    info!("Received forecast request for city: {} on {}", city, date);

    // Stored overrides always win over the live provider.
    if let Some(record) = state.store.find(city, date).await? {
        info!("Serving override for city: {} on {}", city, date);
        return Ok(HttpResponse::Ok().json(Forecast {
            min_temperature: record.min_temperature,
            max_temperature: record.max_temperature,
        }));
    }

    match state.provider.forecast(city, date).await {
        Ok(forecast) => Ok(HttpResponse::Ok().json(forecast)),
        Err(e) => {
            warn!("Forecast lookup failed for city: {} on {}: {}", city, date, e);
            Err(e.into())
        }
    }
}

pub async fn submit_forecast(
    body: web::Json<ForecastSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let today = state.clock.today();
    let record = body
        .validate(today, state.config.forecast.window_days)
        .map_err(|errors| {
            warn!("Rejected forecast submission: {}", errors);
            errors
        })?;

    let outcome = state.store.upsert(&record).await?;
    info!("Stored override {} ({:?})", record, outcome);

    let response = ForecastOverrideResponse {
        city: record.city,
        date: format_date(record.date),
        min_temperature: record.min_temperature,
        max_temperature: record.max_temperature,
    };

    let mut builder = if outcome.was_created() {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(builder.json(response))
}
