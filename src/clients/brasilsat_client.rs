//! Cliente HTTP para la API de rastreo BrasilSat
//!
//! Este módulo contiene el cliente HTTP del proveedor GPS: autorización firmada
//! con MD5 y consulta de la última posición/estado de un dispositivo.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CredentialProvider, ProviderToken, TelemetryError, TelemetryFetcher};
use crate::config::EnvironmentConfig;
use crate::models::RawReading;

/// Cliente HTTP para BrasilSat (autorización + track)
pub struct BrasilsatClient {
    client: Client,
    base_url: String,
    account: String,
    password: String,
    timeout: Duration,
}

/// Sobre común de las respuestas del proveedor
#[derive(Debug, Deserialize)]
struct ProviderEnvelope<T> {
    #[serde(default, deserialize_with = "lenient_i64")]
    code: i64,
    #[serde(default, alias = "msg")]
    message: Option<String>,
    record: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationRecord {
    access_token: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    expires_in: Option<i64>,
}

/// Registro de `/api/track` para un IMEI
#[derive(Debug, Default, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub imei: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub accstatus: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub acctime: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mileage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub externalpower: f64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub servertime: Option<i64>,
}

impl TrackRecord {
    /// Normalizar el registro del proveedor. Sin `servertime` se usa el reloj local.
    pub fn into_reading(self, requested_device_id: &str, now: i64) -> RawReading {
        let device_id = self
            .imei
            .filter(|imei| !imei.trim().is_empty())
            .unwrap_or_else(|| requested_device_id.to_string());

        RawReading {
            device_id,
            engine_on: self.accstatus != 0,
            cycle_running_seconds: self.acctime.max(0),
            odometer_meters: self.mileage.max(0.0),
            battery_voltage: self.externalpower,
            server_time: self.servertime.filter(|t| *t > 0).unwrap_or(now),
        }
    }
}

/// Firma de autorización: `md5(md5(password) + time)` en hex
pub fn sign_request(password: &str, time: i64) -> String {
    let password_hash = format!("{:x}", md5::compute(password.as_bytes()));
    format!("{:x}", md5::compute(format!("{}{}", password_hash, time).as_bytes()))
}

impl BrasilsatClient {
    /// Crear nuevo cliente HTTP con URL configurable
    pub fn new(base_url: String, account: String, password: String, timeout: Duration) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Network(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account,
            password,
            timeout,
        })
    }

    pub fn from_config(config: &EnvironmentConfig) -> Result<Self, TelemetryError> {
        Self::new(
            config.brasilsat_base_url.clone(),
            config.brasilsat_account.clone(),
            config.brasilsat_password.clone(),
            config.upstream_timeout(),
        )
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ProviderEnvelope<T>, TelemetryError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!("📡 {} -> {}", path, status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TelemetryError::Auth(format!("HTTP {} on {}", status, path)));
        }
        if !status.is_success() {
            return Err(TelemetryError::Network(format!("HTTP {} on {}", status, path)));
        }

        response
            .json::<ProviderEnvelope<T>>()
            .await
            .map_err(|e| TelemetryError::Malformed(e.to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> TelemetryError {
        if error.is_timeout() {
            TelemetryError::Timeout(self.timeout)
        } else {
            TelemetryError::Network(error.to_string())
        }
    }
}

/// Código distinto de 0: se distingue un token rechazado de cualquier otro fallo
fn provider_error(code: i64, message: Option<String>) -> TelemetryError {
    let message = message.unwrap_or_else(|| "no message".to_string());
    if message.to_lowercase().contains("token") {
        TelemetryError::Auth(format!("code {}: {}", code, message))
    } else {
        TelemetryError::Provider { code, message }
    }
}

#[async_trait]
impl CredentialProvider for BrasilsatClient {
    async fn get_token(&self) -> Result<ProviderToken, TelemetryError> {
        let now = chrono::Utc::now().timestamp();
        let query = [
            ("time", now.to_string()),
            ("account", self.account.clone()),
            ("signature", sign_request(&self.password, now)),
        ];

        let envelope: ProviderEnvelope<AuthorizationRecord> =
            self.get_envelope("/api/authorization", &query).await?;

        if envelope.code != 0 {
            warn!("🔑 Autorización rechazada por BrasilSat (code {})", envelope.code);
            return Err(TelemetryError::Auth(format!(
                "code {}: {}",
                envelope.code,
                envelope.message.unwrap_or_default()
            )));
        }

        let record = envelope
            .record
            .ok_or_else(|| TelemetryError::Malformed("authorization without record".to_string()))?;

        Ok(ProviderToken {
            access_token: record.access_token,
            expires_in: record.expires_in.filter(|s| *s > 0).map(|s| s as u64),
        })
    }
}

#[async_trait]
impl TelemetryFetcher for BrasilsatClient {
    async fn fetch_raw(&self, access_token: &str, device_id: &str) -> Result<RawReading, TelemetryError> {
        let query = [
            ("access_token", access_token.to_string()),
            ("imeis", device_id.to_string()),
        ];

        let envelope: ProviderEnvelope<Vec<TrackRecord>> = self.get_envelope("/api/track", &query).await?;

        if envelope.code != 0 {
            return Err(provider_error(envelope.code, envelope.message));
        }

        let record = envelope
            .record
            .and_then(|records| records.into_iter().next())
            .ok_or_else(|| TelemetryError::Malformed(format!("no track record for {}", device_id)))?;

        Ok(record.into_reading(device_id, chrono::Utc::now().timestamp()))
    }
}

// El proveedor mezcla números y strings numéricos en los mismos campos

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64).unwrap_or(0.0))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(lenient_opt_i64(deserializer)?.unwrap_or(0))
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64).map(|n| n as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_request() {
        assert_eq!(sign_request("1234567", 1_700_000_000), "fae6c271f5cd5094aac9600e2ecad074");
    }

    #[test]
    fn test_track_record_accepts_strings_and_numbers() {
        let envelope: ProviderEnvelope<Vec<TrackRecord>> = serde_json::from_str(
            r#"{"code":0,"record":[{"imei":"355468593059041","accstatus":"1","acctime":5400,
                "mileage":"123456.7","externalpower":"12.6","servertime":1700000000}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.code, 0);

        let record = envelope.record.unwrap().into_iter().next().unwrap();
        let reading = record.into_reading("355468593059041", 42);
        assert!(reading.engine_on);
        assert_eq!(reading.cycle_running_seconds, 5_400);
        assert_eq!(reading.odometer_meters, 123_456.7);
        assert_eq!(reading.battery_voltage, 12.6);
        assert_eq!(reading.server_time, 1_700_000_000);
    }

    #[test]
    fn test_track_record_defaults() {
        let record: TrackRecord = serde_json::from_str(r#"{"accstatus":null}"#).unwrap();
        let reading = record.into_reading("861234", 1_700_000_123);
        assert_eq!(reading.device_id, "861234");
        assert!(!reading.engine_on);
        assert_eq!(reading.odometer_meters, 0.0);
        assert_eq!(reading.server_time, 1_700_000_123);
    }

    #[test]
    fn test_provider_error_classification() {
        assert!(provider_error(10_004, Some("Access token expired".to_string())).is_auth());
        assert_eq!(
            provider_error(3, Some("imei not found".to_string())),
            TelemetryError::Provider {
                code: 3,
                message: "imei not found".to_string()
            }
        );
    }
}
