//! Savings tracker server binary.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use savings_tracker::adapters::http::{app_router, AppServices, HttpOptions};
use savings_tracker::adapters::postgres::{self, PostgresRecordStore};
use savings_tracker::adapters::{InMemoryRateLimiter, InMemoryRecordStore};
use savings_tracker::application::{RecordCommands, SyncHub};
use savings_tracker::config::{AppConfig, DatabaseConfig};
use savings_tracker::ports::{ChangeNotifier, RateLimiter, RecordStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let store = open_store(&config.database).await?;
    let hub = Arc::new(SyncHub::new(
        store.clone(),
        config.sync.goal()?,
        config.sync.channel_capacity,
    ));
    let notifier: Arc<dyn ChangeNotifier> = hub.dispatcher();
    let commands = Arc::new(RecordCommands::new(store, notifier));
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(config.throttle.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = hub.start_reaper(config.sync.reaper_config(), shutdown_rx);

    let options = HttpOptions {
        environment: config.server.environment.as_str().to_string(),
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
        trust_forwarded_headers: config.server.trust_forwarded_headers,
    };
    let app = app_router(
        AppServices {
            hub: hub.clone(),
            commands,
            limiter,
        },
        &options,
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = %options.environment,
        "Savings tracker listening"
    );

    let shutdown = {
        let hub = hub.clone();
        async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
            let closed = hub.disconnect_all().await;
            tracing::info!(closed_sessions = closed, "Viewer connections closed");
        }
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    if let Err(e) = reaper.await {
        tracing::warn!("Inactivity reaper ended abnormally: {}", e);
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// PostgreSQL when a URL is configured, otherwise the in-memory store.
async fn open_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn RecordStore>, Box<dyn Error + Send + Sync>> {
    let Some(url) = config.url() else {
        tracing::warn!("No database URL configured, records are kept in memory");
        return Ok(Arc::new(InMemoryRecordStore::new()));
    };

    let pool: PgPool = postgres::connect(config, url).await?;
    if config.run_migrations {
        postgres::migrate(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    tracing::info!(
        max_connections = config.max_connections,
        "Connected to PostgreSQL"
    );
    Ok(Arc::new(PostgresRecordStore::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
