//! Cache de lecturas de telemetría
//!
//! Componente dueño de la sesión con el proveedor y de una lectura cacheada por
//! dispositivo. Cada dispositivo tiene su propio slot protegido por un mutex
//! async: mientras una descarga está en vuelo, el resto de llamadas para ese
//! dispositivo espera y reutiliza el resultado en lugar de repetir la llamada.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::cache_config::TelemetryCacheConfig;
use crate::clients::{CredentialProvider, TelemetryError, TelemetryFetcher};
use crate::models::{CachedReading, RawReading};

type ReadingSlot = Arc<Mutex<Option<CachedReading>>>;

#[derive(Debug, Clone)]
struct SessionToken {
    access_token: String,
    expires_at: Instant,
}

impl SessionToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_calls: AtomicU64,
    token_refreshes: AtomicU64,
}

/// Estadísticas del cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub upstream_calls: u64,
    pub token_refreshes: u64,
}

pub struct TelemetryCache {
    credentials: Arc<dyn CredentialProvider>,
    fetcher: Arc<dyn TelemetryFetcher>,
    config: TelemetryCacheConfig,
    token: Mutex<Option<SessionToken>>,
    slots: RwLock<HashMap<String, ReadingSlot>>,
    counters: CacheCounters,
}

impl TelemetryCache {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        fetcher: Arc<dyn TelemetryFetcher>,
        config: TelemetryCacheConfig,
    ) -> Self {
        Self {
            credentials,
            fetcher,
            config,
            token: Mutex::new(None),
            slots: RwLock::new(HashMap::new()),
            counters: CacheCounters::default(),
        }
    }

    /// Obtener la lectura de un dispositivo: del cache si está fresca, del
    /// proveedor si no. Un fallo no borra la lectura anterior del slot.
    pub async fn fetch(&self, device_id: &str) -> Result<CachedReading, TelemetryError> {
        let slot = self.slot(device_id).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh(self.config.reading_ttl) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("📦 Lectura HIT para {} (edad {:?})", device_id, cached.age());
                return Ok(cached.clone());
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("❌ Lectura MISS para {}", device_id);

        let reading = self.fetch_upstream(device_id).await?;
        let cached = CachedReading::new(reading);
        *entry = Some(cached.clone());

        Ok(cached)
    }

    /// Token de sesión vigente, renovándolo si falta o expiró
    pub async fn access_token(&self) -> Result<String, TelemetryError> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref() {
            if current.is_valid() {
                return Ok(current.access_token.clone());
            }
            debug!("⏰ Token de sesión expirado");
        }

        let fresh = self.with_timeout(self.credentials.get_token()).await?;
        self.counters.token_refreshes.fetch_add(1, Ordering::Relaxed);

        // La vida útil es la menor entre la configurada y la anunciada
        let lifetime = fresh
            .expires_in
            .map(Duration::from_secs)
            .map_or(self.config.token_lifetime, |announced| announced.min(self.config.token_lifetime));
        info!("🔑 Nueva sesión con el proveedor (válida {:?})", lifetime);

        let access_token = fresh.access_token.clone();
        *token = Some(SessionToken {
            access_token: fresh.access_token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }

    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Descarta la lectura cacheada de un dispositivo
    pub async fn invalidate(&self, device_id: &str) {
        let slot = self.slots.read().await.get(device_id).cloned();
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            upstream_calls: self.counters.upstream_calls.load(Ordering::Relaxed),
            token_refreshes: self.counters.token_refreshes.load(Ordering::Relaxed),
        }
    }

    async fn slot(&self, device_id: &str) -> ReadingSlot {
        if let Some(slot) = self.slots.read().await.get(device_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Una llamada al proveedor; un rechazo de credencial fuerza renovación y
    /// se reintenta una sola vez.
    async fn fetch_upstream(&self, device_id: &str) -> Result<RawReading, TelemetryError> {
        let token = self.access_token().await?;

        match self.fetch_once(&token, device_id).await {
            Err(error) if error.is_auth() => {
                warn!("🔄 Credencial rechazada para {}, renovando sesión: {}", device_id, error);
                self.invalidate_token().await;
                let token = self.access_token().await?;
                self.fetch_once(&token, device_id).await
            }
            other => other,
        }
    }

    async fn fetch_once(&self, token: &str, device_id: &str) -> Result<RawReading, TelemetryError> {
        self.counters.upstream_calls.fetch_add(1, Ordering::Relaxed);
        self.with_timeout(self.fetcher.fetch_raw(token, device_id)).await
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, TelemetryError>>,
    ) -> Result<T, TelemetryError> {
        match tokio::time::timeout(self.config.upstream_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ El proveedor no respondió en {:?}", self.config.upstream_timeout);
                Err(TelemetryError::Timeout(self.config.upstream_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockTelemetryProvider;

    const DEVICE: &str = "355468593059041";

    fn cache_with(mock: Arc<MockTelemetryProvider>) -> TelemetryCache {
        TelemetryCache::new(mock.clone(), mock, TelemetryCacheConfig::default())
    }

    fn mock() -> Arc<MockTelemetryProvider> {
        let mock = MockTelemetryProvider::new();
        mock.set_engine(DEVICE, 1_700_000_000, true);
        Arc::new(mock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_within_window_hits_cache() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        let first = cache.fetch(DEVICE).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = cache.fetch(DEVICE).await.unwrap();

        assert_eq!(first.reading, second.reading);
        assert_eq!(mock.track_calls(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        cache.fetch(DEVICE).await.unwrap();
        mock.set_engine(DEVICE, 1_700_000_030, false);
        tokio::time::advance(Duration::from_secs(21)).await;

        let refreshed = cache.fetch(DEVICE).await.unwrap();
        assert_eq!(refreshed.reading.server_time, 1_700_000_030);
        assert!(!refreshed.reading.engine_on);
        assert_eq!(mock.track_calls(), 2);
        // La sesión sigue vigente: no se pidió otro token
        assert_eq!(mock.token_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_upstream_call() {
        let mock = Arc::new(
            MockTelemetryProvider::new().with_latency(Duration::from_secs(2)),
        );
        mock.set_engine(DEVICE, 1_700_000_000, true);
        let cache = cache_with(mock.clone());

        let results = futures::future::join_all((0..8).map(|_| cache.fetch(DEVICE))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(mock.track_calls(), 1);
        assert_eq!(mock.token_requests(), 1);
        assert_eq!(cache.stats().hits, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_expires_with_configured_lifetime() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        cache.access_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(49 * 60)).await;
        cache.access_token().await.unwrap();
        assert_eq!(mock.token_requests(), 1);

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        let token = cache.access_token().await.unwrap();
        assert_eq!(token, "mock-token-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_rejection_refreshes_and_retries_once() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        mock.reject_token("mock-token-1");
        let reading = cache.fetch(DEVICE).await.unwrap();

        assert_eq!(reading.reading.device_id, DEVICE);
        assert_eq!(mock.token_requests(), 2);
        assert_eq!(mock.track_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_auth_rejection_surfaces() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        mock.reject_token("mock-token-1");
        mock.reject_token("mock-token-2");
        let error = cache.fetch(DEVICE).await.unwrap_err();

        assert!(error.is_auth());
        assert_eq!(mock.track_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_error_is_not_retried_and_keeps_entry() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        cache.fetch(DEVICE).await.unwrap();
        tokio::time::advance(Duration::from_secs(25)).await;

        mock.fail_next(TelemetryError::Network("connection reset".to_string()));
        assert!(matches!(cache.fetch(DEVICE).await, Err(TelemetryError::Network(_))));
        assert_eq!(mock.track_calls(), 2);

        // El siguiente intento vuelve al proveedor
        assert!(cache.fetch(DEVICE).await.is_ok());
        assert_eq!(mock.track_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let mock = Arc::new(MockTelemetryProvider::new().with_latency(Duration::from_secs(60)));
        mock.set_engine(DEVICE, 1_700_000_000, true);
        let cache = cache_with(mock.clone());

        let error = cache.fetch(DEVICE).await.unwrap_err();
        assert_eq!(error, TelemetryError::Timeout(Duration::from_secs(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let mock = mock();
        let cache = cache_with(mock.clone());

        cache.fetch(DEVICE).await.unwrap();
        cache.invalidate(DEVICE).await;
        cache.fetch(DEVICE).await.unwrap();

        assert_eq!(mock.track_calls(), 2);
    }
}
