use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// Key used for messages that concern more than one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const SERVICE_UNAVAILABLE_MESSAGE: &str = "Weather service unavailable";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MissingParameter(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MissingParameter(msg) => msg.clone(),
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::MalformedRequest(msg) => format!("Malformed request: {}", msg),
            AppError::Provider(e) => match e {
                ProviderError::CityNotFound(_) | ProviderError::ForecastNotFound(_) => e.to_string(),
                ProviderError::ExternalService(_) => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
                ProviderError::MalformedResponse(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            },
            AppError::DatabaseError(_)
            | AppError::ConfigError(_)
            | AppError::InternalError(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed with internal error: {}", self);
        }

        let mut body = json!({
            "status": status.as_u16(),
            "message": self.public_message(),
        });
        if let AppError::Validation(fields) = self {
            body["fields"] = json!(fields);
        }

        HttpResponse::build(status).json(json!({ "error": body }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(e) => match e {
                ProviderError::CityNotFound(_) => StatusCode::NOT_FOUND,
                ProviderError::ForecastNotFound(_) => StatusCode::BAD_REQUEST,
                ProviderError::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
                ProviderError::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Normalized failures of the remote weather provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("City '{0}' not found")]
    CityNotFound(String),

    #[error("{0}")]
    ForecastNotFound(String),

    #[error("Weather service unavailable: {0}")]
    ExternalService(String),

    #[error("Unexpected provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key in its query string.
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::ExternalService("request timed out".to_string())
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::ExternalService(format!("Network error: {}", err))
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

/// A single field-level validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,

    #[error("This field may not be blank.")]
    Blank,

    #[error("Ensure this field has no more than {0} characters.")]
    TooLong(usize),

    #[error("Invalid date format. Use dd.MM.yyyy")]
    InvalidDateFormat,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Date cannot be in the past")]
    DateInPast,

    #[error("Forecast is available only for the next {0} days")]
    ForecastWindowExceeded(i64),

    #[error("Minimum temperature cannot exceed maximum temperature")]
    InvalidTemperatureRange,
}

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, err: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(field, err);
        errors
    }

    pub fn add(&mut self, field: &str, err: ValidationError) {
        self.0.entry(field.to_string()).or_default().push(err.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str, err: &ValidationError) -> bool {
        let expected = err.to_string();
        self.get(field)
            .map(|messages| messages.iter().any(|m| *m == expected))
            .unwrap_or(false)
    }

}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
