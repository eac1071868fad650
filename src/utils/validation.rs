//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos recibidos por la API.

use serde_json::Value;
use validator::ValidationError;

use super::errors::AppError;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar identificador de dispositivo (IMEI u otro id alfanumérico del rastreador)
pub fn validate_device_id(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 32
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        let mut error = ValidationError::new("device_id");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Convertir un valor JSON numérico (número o string numérico) a `f64`.
///
/// Cualquier otra cosa se rechaza como calibración inválida, antes de tocar el estado.
pub fn parse_numeric_value(value: &Value, field: &str) -> Result<f64, AppError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        Value::Null => {
            return Err(AppError::InvalidCalibration(format!("{} is required", field)));
        }
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(AppError::InvalidCalibration(format!("{} must be a number", field))),
    }
}
