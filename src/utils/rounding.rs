//! Redondeo de valores de uso

/// Redondea a dos decimales, el formato con el que se exponen horas y km.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
