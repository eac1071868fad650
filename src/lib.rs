//! Horímetro y mantenimiento preventivo para activos con rastreador GPS
//!
//! Consulta BrasilSat a través de un cache con sesión compartida, acumula horas
//! de motor por activo y evalúa el plan preventivo contra el uso acumulado.

pub mod cache;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
