use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleet_ops::build_app;
use fleet_ops::config::environment::EnvironmentConfig;
use fleet_ops::state::AppState;
use fleet_ops::storage::{bootstrap, FileBackend, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚚 Fleet Ops - Record Store API");
    info!("================================");

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;

    // Inicializar colecciones
    let backend = FileBackend::new(config.data_dir.clone());
    let store = RecordStore::new(Arc::new(backend));
    if let Err(e) = bootstrap(&store).await {
        error!("❌ Error inicializando el almacenamiento: {}", e);
        return Err(anyhow::anyhow!("Error de almacenamiento: {}", e));
    }
    info!("✅ Colecciones listas en {}", config.data_dir.display());

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    let app = build_app(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("👤 Cuentas:");
    info!("   POST /api/accounts/register");
    info!("   GET|PUT /api/accounts/profile");
    info!("🔑 Flota:");
    info!("   GET|POST|DELETE /api/fleet/code");
    info!("   POST /api/fleet/join");
    info!("   GET  /api/fleet/members");
    info!("   DELETE /api/fleet/members/:driver_id");
    info!("🚛 Camiones:");
    info!("   GET|POST /api/trucks");
    info!("   GET|PUT|DELETE /api/trucks/:id");
    info!("📋 Checklists:");
    info!("   GET|POST /api/checklists");
    info!("   PUT|DELETE /api/checklists/:id");
    info!("   PATCH /api/checklists/completion");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

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
