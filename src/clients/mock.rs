//! Proveedor de telemetría en memoria
//!
//! Sustituye a BrasilSat en pruebas y en desarrollo local: guarda una lectura por
//! dispositivo, cuenta las llamadas al "upstream" y permite inyectar fallos.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{CredentialProvider, ProviderToken, TelemetryError, TelemetryFetcher};
use crate::models::RawReading;

#[derive(Default)]
pub struct MockTelemetryProvider {
    readings: Mutex<HashMap<String, RawReading>>,
    rejected_tokens: Mutex<HashSet<String>>,
    next_failure: Mutex<Option<TelemetryError>>,
    latency: Option<Duration>,
    track_calls: AtomicUsize,
    token_requests: AtomicUsize,
}

impl MockTelemetryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula la latencia del proveedor en cada llamada de track
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_reading(&self, reading: RawReading) {
        if let Ok(mut readings) = self.readings.lock() {
            readings.insert(reading.device_id.clone(), reading);
        }
    }

    /// Atajo: actualiza solo `servertime` y el estado del motor
    pub fn set_engine(&self, device_id: &str, server_time: i64, engine_on: bool) {
        if let Ok(mut readings) = self.readings.lock() {
            let reading = readings.entry(device_id.to_string()).or_insert_with(|| RawReading {
                device_id: device_id.to_string(),
                engine_on,
                cycle_running_seconds: 0,
                odometer_meters: 0.0,
                battery_voltage: 12.6,
                server_time,
            });
            reading.server_time = server_time;
            reading.engine_on = engine_on;
        }
    }

    /// El próximo track con este token responde como token expirado
    pub fn reject_token(&self, access_token: &str) {
        if let Ok(mut rejected) = self.rejected_tokens.lock() {
            rejected.insert(access_token.to_string());
        }
    }

    /// La próxima llamada de track falla con este error
    pub fn fail_next(&self, error: TelemetryError) {
        if let Ok(mut next) = self.next_failure.lock() {
            *next = Some(error);
        }
    }

    pub fn track_calls(&self) -> usize {
        self.track_calls.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for MockTelemetryProvider {
    async fn get_token(&self) -> Result<ProviderToken, TelemetryError> {
        let n = self.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProviderToken {
            access_token: format!("mock-token-{}", n),
            expires_in: Some(3600),
        })
    }
}

#[async_trait]
impl TelemetryFetcher for MockTelemetryProvider {
    async fn fetch_raw(&self, access_token: &str, device_id: &str) -> Result<RawReading, TelemetryError> {
        self.track_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self.next_failure.lock().ok().and_then(|mut next| next.take());
        if let Some(error) = injected {
            return Err(error);
        }

        let rejected = self
            .rejected_tokens
            .lock()
            .map(|mut rejected| rejected.remove(access_token))
            .unwrap_or(false);
        if rejected {
            return Err(TelemetryError::Auth(format!("token {} expired", access_token)));
        }

        self.readings
            .lock()
            .ok()
            .and_then(|readings| readings.get(device_id).cloned())
            .ok_or_else(|| TelemetryError::Provider {
                code: 3,
                message: format!("imei {} not found", device_id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_and_failures() {
        let mock = MockTelemetryProvider::new();
        mock.set_engine("861234", 1_700_000_000, true);

        let token = mock.get_token().await.unwrap();
        assert_eq!(token.access_token, "mock-token-1");

        let reading = mock.fetch_raw(&token.access_token, "861234").await.unwrap();
        assert!(reading.engine_on);

        mock.reject_token(&token.access_token);
        assert!(mock.fetch_raw(&token.access_token, "861234").await.unwrap_err().is_auth());
        // El rechazo se consume una sola vez
        assert!(mock.fetch_raw(&token.access_token, "861234").await.is_ok());

        assert!(matches!(
            mock.fetch_raw("t", "unknown").await,
            Err(TelemetryError::Provider { code: 3, .. })
        ));
        assert_eq!(mock.track_calls(), 4);
        assert_eq!(mock.token_requests(), 1);
    }
}
