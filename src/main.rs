use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use dotenvy::dotenv;

use asset_usage_tracker::cache::{TelemetryCache, TelemetryCacheConfig};
use asset_usage_tracker::clients::BrasilsatClient;
use asset_usage_tracker::config::environment::EnvironmentConfig;
use asset_usage_tracker::controllers::AssetController;
use asset_usage_tracker::database;
use asset_usage_tracker::repositories::{AssetRepository, InMemoryAssetRepository, PgAssetRepository};
use asset_usage_tracker::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::default();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    info!("⛵ Asset Usage Tracker - Horímetro y mantenimiento preventivo");
    info!("================================================");

    // Almacén: PostgreSQL si hay DATABASE_URL, si no en memoria
    let (repository, storage): (Arc<dyn AssetRepository>, &'static str) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = database::create_pool(url).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                anyhow::anyhow!("Error de base de datos: {}", e)
            })?;
            database::run_migrations(&pool).await?;
            let repository: Arc<dyn AssetRepository> = Arc::new(PgAssetRepository::new(pool));
            (repository, "postgres")
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida: los activos se guardan solo en memoria");
            let repository: Arc<dyn AssetRepository> = Arc::new(InMemoryAssetRepository::new());
            (repository, "memory")
        }
    };

    // Cliente del proveedor y cache de lecturas
    if !config.has_provider_credentials() {
        warn!("⚠️ BRASILSAT_ACCOUNT/BRASILSAT_PASSWORD vacíos: las consultas al proveedor van a fallar");
    }
    let client = Arc::new(BrasilsatClient::from_config(&config)?);
    let cache_config = TelemetryCacheConfig::from_env_config(&config);
    info!(
        "📦 Cache de lecturas: TTL {:?}, sesión {:?}, timeout {:?}",
        cache_config.reading_ttl, cache_config.token_lifetime, cache_config.upstream_timeout
    );
    let telemetry = Arc::new(TelemetryCache::new(client.clone(), client, cache_config));

    let app_state = AppState::new(config.clone(), repository, telemetry, storage);

    // Activo inicial
    AssetController::new(&app_state)
        .bootstrap_if_empty(config.bootstrap.as_ref())
        .await?;

    let app = create_app(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("⛵ Activos:");
    info!("   GET|POST /api/assets - Listar / registrar activos");
    info!("   GET|PUT|DELETE /api/assets/:id - Obtener / actualizar / eliminar");
    info!("   POST /api/assets/:id/select - Marcar como activo actual");
    info!("⏱️ Uso y mantenimiento:");
    info!("   GET  /api/assets/:id/usage - Horímetro / odómetro");
    info!("   GET  /api/assets/:id/maintenance - Tareas preventivas");
    info!("   GET|PUT /api/assets/:id/plan - Plan preventivo");
    info!("   GET|PUT /api/assets/:id/offset - Offset de odómetro");
    info!("   GET|POST /api/assets/:id/calibration - Totales / calibrar");
    info!("   GET  /api/current/usage, /api/current/maintenance - Activo actual");
    info!("   GET  /api/fleet/usage - Toda la flota");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
