//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! usadas por los DTOs (`#[validate(custom = ...)]`) y por el flujo de reservas.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppResult};

lazy_static! {
    // VIN ISO 3779: 17 caracteres, sin I, O ni Q
    static ref VIN_RE: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9 ()\-.]+$").unwrap();
}

/// Validar que un string no esté vacío (ni sólo espacios)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico). Vacío = campo no informado.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_RE.is_match(value) || !(7..=15).contains(&digits) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de VIN
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    if !VIN_RE.is_match(&value.to_ascii_uppercase()) {
        let mut error = ValidationError::new("vin");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"17 characters, no I/O/Q".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.len() < 2 || clean_plate.len() > 10 {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que una tarifa sea positiva
pub fn validate_rate(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("positive_rate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Rango de fechas de una reserva: `today <= start_date <= end_date`.
/// Se verifica antes de cualquier escritura.
pub fn validate_booking_dates(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<()> {
    if start_date < today {
        return Err(validation_error(
            "start_date",
            "Start date cannot be in the past",
        ));
    }
    if end_date < start_date {
        return Err(validation_error(
            "end_date",
            "End date must be on or after the start date",
        ));
    }
    Ok(())
}

/// Normalizar email para búsquedas y unicidad
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Convertir strings vacíos de formularios en `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_validate_booking_dates() {
        let today = date("2025-06-10");
        assert!(validate_booking_dates(today, today, today).is_ok());
        assert!(validate_booking_dates(today, date("2025-06-12"), today).is_ok());
        assert!(validate_booking_dates(date("2025-06-09"), date("2025-06-12"), today).is_err());
        assert!(validate_booking_dates(date("2025-06-12"), date("2025-06-11"), today).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+63 917 123 4567").is_ok());
        assert!(validate_phone("(555) 010-2030").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("").is_ok());
    }

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1HGCM82633A004352").is_ok());
        assert!(validate_vin("1hgcm82633a004352").is_ok());
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A00435O").is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(&Decimal::new(4500, 2)).is_ok());
        assert!(validate_rate(&Decimal::ZERO).is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" x ".into())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
