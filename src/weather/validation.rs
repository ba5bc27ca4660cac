//! Input validation for forecast lookups and submissions.
//!
//! Dates travel as `dd.MM.yyyy`. A date is accepted when it falls inside the
//! inclusive window `[today, today + window_days]`, where "today" comes from
//! the injected [`Clock`](crate::clock::Clock).

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::models::{ForecastOverride, CITY_MAX_LEN};
use crate::error::{FieldErrors, ValidationError, NON_FIELD_ERRORS};

pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `dd.MM.yyyy`, digits only, no surrounding whitespace.
fn has_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            _ => b.is_ascii_digit(),
        })
}

/// Parses a `dd.MM.yyyy` date. Shape is checked before calendar validity, so
/// `2025-01-01` is a format error while `31.02.2025` is an invalid date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    if !has_date_shape(value) {
        return Err(ValidationError::InvalidDateFormat);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate)
}

pub fn check_window(date: NaiveDate, today: NaiveDate, window_days: i64) -> Result<(), ValidationError> {
    if date < today {
        return Err(ValidationError::DateInPast);
    }
    if (date - today).num_days() > window_days {
        return Err(ValidationError::ForecastWindowExceeded(window_days));
    }
    Ok(())
}

/// Parses `value` and checks it against the forecast window.
pub fn validate_forecast_date(
    value: &str,
    today: NaiveDate,
    window_days: i64,
) -> Result<NaiveDate, ValidationError> {
    let date = parse_date(value)?;
    check_window(date, today, window_days)?;
    Ok(date)
}

pub fn check_temperature_range(min: f64, max: f64) -> Result<(), ValidationError> {
    if min > max {
        return Err(ValidationError::InvalidTemperatureRange);
    }
    Ok(())
}

fn validate_city(value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank);
    }
    if value.chars().count() > CITY_MAX_LEN {
        return Err(ValidationError::TooLong(CITY_MAX_LEN));
    }
    Ok(value.to_string())
}

/// Body of a forecast override submission. Every field is optional at the
/// wire level so that missing fields are reported individually.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastSubmission {
    pub city: Option<String>,
    pub date: Option<String>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
}

impl ForecastSubmission {
    /// Runs every check and returns either the record to store or all
    /// collected field errors.
    pub fn validate(&self, today: NaiveDate, window_days: i64) -> Result<ForecastOverride, FieldErrors> {
        let mut errors = FieldErrors::new();

        let city = match self.city.as_deref() {
            None => {
                errors.add("city", ValidationError::Required);
                None
            }
            Some(value) => validate_city(value)
                .map_err(|e| errors.add("city", e))
                .ok(),
        };

        let date = match self.date.as_deref() {
            None => {
                errors.add("date", ValidationError::Required);
                None
            }
            Some(value) => validate_forecast_date(value, today, window_days)
                .map_err(|e| errors.add("date", e))
                .ok(),
        };

        if self.min_temperature.is_none() {
            errors.add("min_temperature", ValidationError::Required);
        }
        if self.max_temperature.is_none() {
            errors.add("max_temperature", ValidationError::Required);
        }
        if let (Some(min), Some(max)) = (self.min_temperature, self.max_temperature) {
            if let Err(e) = check_temperature_range(min, max) {
                errors.add(NON_FIELD_ERRORS, e);
            }
        }

        match (city, date, self.min_temperature, self.max_temperature) {
            (Some(city), Some(date), Some(min), Some(max)) if errors.is_empty() => {
                Ok(ForecastOverride::new(city, date, min, max))
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn submission(date: NaiveDate, min: f64, max: f64) -> ForecastSubmission {
        ForecastSubmission {
            city: Some("Paris".to_string()),
            date: Some(format_date(date)),
            min_temperature: Some(min),
            max_temperature: Some(max),
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("01.02.2025"), Ok(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
        assert_eq!(parse_date("29.02.2024"), Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    }

    #[test]
    fn test_parse_date_rejects_other_shapes() {
        for value in ["2025-01-01", "1.2.2025", "01/02/2025", "01.02.25", " 01.02.2025", "aa.bb.cccc", ""] {
            assert_eq!(parse_date(value), Err(ValidationError::InvalidDateFormat), "{}", value);
        }
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert_eq!(parse_date("31.02.2025"), Err(ValidationError::InvalidDate));
        assert_eq!(parse_date("29.02.2025"), Err(ValidationError::InvalidDate));
        assert_eq!(parse_date("00.01.2025"), Err(ValidationError::InvalidDate));
        assert_eq!(parse_date("01.13.2025"), Err(ValidationError::InvalidDate));
    }

    #[test]
    fn test_window_bounds() {
        let today = today();
        assert_eq!(check_window(today - Duration::days(1), today, 3), Err(ValidationError::DateInPast));
        assert_eq!(check_window(today, today, 3), Ok(()));
        assert_eq!(check_window(today + Duration::days(3), today, 3), Ok(()));
        assert_eq!(
            check_window(today + Duration::days(4), today, 3),
            Err(ValidationError::ForecastWindowExceeded(3))
        );
    }

    #[test]
    fn test_validate_forecast_date() {
        let today = today();
        assert_eq!(validate_forecast_date("12.06.2025", today, 3), Ok(today + Duration::days(2)));
        assert_eq!(validate_forecast_date("09.06.2025", today, 3), Err(ValidationError::DateInPast));
        assert_eq!(validate_forecast_date("2025-06-12", today, 3), Err(ValidationError::InvalidDateFormat));
    }

    #[test]
    fn test_temperature_range() {
        assert!(check_temperature_range(10.0, 18.0).is_ok());
        assert!(check_temperature_range(10.0, 10.0).is_ok());
        assert_eq!(check_temperature_range(18.5, 18.0), Err(ValidationError::InvalidTemperatureRange));
    }

    #[test]
    fn test_valid_submission() {
        let date = today() + Duration::days(1);
        let record = submission(date, 10.0, 18.0).validate(today(), 3).unwrap();
        assert_eq!(record, ForecastOverride::new("Paris".to_string(), date, 10.0, 18.0));
    }

    #[test]
    fn test_missing_fields_are_reported_individually() {
        let errors = ForecastSubmission::default().validate(today(), 3).unwrap_err();
        for field in ["city", "date", "min_temperature", "max_temperature"] {
            assert!(errors.contains(field, &ValidationError::Required), "{}", field);
        }
    }

    #[test]
    fn test_inverted_range_reported_alongside_other_errors() {
        let mut input = submission(today(), 20.0, 5.0);
        input.date = Some("2025/06/10".to_string());

        let errors = input.validate(today(), 3).unwrap_err();
        assert!(errors.contains("date", &ValidationError::InvalidDateFormat));
        assert!(errors.contains(NON_FIELD_ERRORS, &ValidationError::InvalidTemperatureRange));
    }

    #[test]
    fn test_city_constraints() {
        let mut input = submission(today(), 1.0, 2.0);
        input.city = Some("   ".to_string());
        assert!(input.validate(today(), 3).unwrap_err().contains("city", &ValidationError::Blank));

        input.city = Some("x".repeat(CITY_MAX_LEN + 1));
        assert!(input
            .validate(today(), 3)
            .unwrap_err()
            .contains("city", &ValidationError::TooLong(CITY_MAX_LEN)));

        input.city = Some("x".repeat(CITY_MAX_LEN));
        assert!(input.validate(today(), 3).is_ok());
    }

    #[test]
    fn test_window_rejections_on_submission() {
        let errors = submission(today() + Duration::days(4), 1.0, 2.0)
            .validate(today(), 3)
            .unwrap_err();
        assert!(errors.contains("date", &ValidationError::ForecastWindowExceeded(3)));

        let errors = submission(today() - Duration::days(1), 1.0, 2.0)
            .validate(today(), 3)
            .unwrap_err();
        assert!(errors.contains("date", &ValidationError::DateInPast));
    }
}
