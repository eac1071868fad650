//! Utilidades del sistema
//! 
//! Este módulo contiene utilidades para manejo de errores, validación
//! y redondeo numérico.

pub mod errors;
pub mod rounding;
pub mod validation;

pub use errors::{AppError, AppResult};
pub use rounding::round2;
