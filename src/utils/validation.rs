//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de entrada antes de que lleguen al almacenamiento.

use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref FLEET_CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{8}$").unwrap();
}

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_TRUCK_YEAR: i32 = 1900;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de email
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if !EMAIL_REGEX.is_match(value) {
        let mut error = ValidationError::new("email");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud mínima de contraseña (el valor nunca se copia al error)
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        let mut error = ValidationError::new("password");
        error.add_param("min".into(), &MIN_PASSWORD_LENGTH);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de código de flota: 8 caracteres alfanuméricos
pub fn validate_fleet_code_format(value: &str) -> Result<(), ValidationError> {
    if !FLEET_CODE_REGEX.is_match(value) {
        let mut error = ValidationError::new("fleet_code");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"8 alphanumeric characters".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar año de fabricación: entre 1900 y el año próximo
pub fn validate_truck_year(year: i32) -> Result<(), ValidationError> {
    let max = Utc::now().year() + 1;
    if year < MIN_TRUCK_YEAR || year > max {
        let mut error = ValidationError::new("year");
        error.add_param("min".into(), &MIN_TRUCK_YEAR);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &year);
        return Err(error);
    }
    Ok(())
}

/// Normalizar un código de flota ingresado por un usuario
pub fn normalize_fleet_code(value: &str) -> String {
    value.trim().to_uppercase()
}
