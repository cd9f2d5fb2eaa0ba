use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use dotenvy::dotenv;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rental_hub::config::{DatabaseConfig, EnvironmentConfig, StoreBackend};
use rental_hub::database::connect_and_migrate;
use rental_hub::repositories::{MemoryStore, PgStore, RecordStore};
use rental_hub::services::SystemClock;
use rental_hub::{create_router, AppState};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Rental Hub - API de reservas");
    info!("================================");

    let config = EnvironmentConfig::from_env()?;

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = connect_and_migrate(&db_config).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("💾 Usando store en memoria (los datos se pierden al reiniciar)");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(config.clone(), store, Arc::new(SystemClock))?;

    let sessions = state.auth.sessions().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired(Utc::now()).await;
            if removed > 0 {
                info!("🧹 {} sesiones expiradas eliminadas", removed);
            }
        }
    });

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    info!("🚀 Servidor iniciado en http://{}", addr);
    info!("   Entorno: {}", config.environment);
    info!("   Cooldown de reservas: {}s", config.booking_cooldown_secs);
    info!("   Proxies de confianza: {:?}", config.trusted_proxies);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
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
