use academic_records::api::{create_router, AppState};
use academic_records::config::Settings;
use academic_records::observability::{
    init_logging, init_metrics, HealthChecker, LogConfig, LogLevel, RequestLogger,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SYSTEM_MODULE: &str = "sistema";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    // Initialize logging
    init_logging(&LogConfig::from(&settings.application));
    info!("Configuration loaded");

    let metrics_handle = init_metrics()?;

    let logger = Arc::new(RequestLogger::from_settings(&settings.request_log));
    logger.log(None, SYSTEM_MODULE, LogLevel::Info, "Iniciando servidor de registros académicos");

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = match PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout_secs))
        .connect(&settings.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            logger.log(
                None,
                SYSTEM_MODULE,
                LogLevel::Error,
                format!("Error de conexión a BD: {}", e),
            );
            return Err(e.into());
        }
    };
    info!("Database connection established");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    let health_checker = Arc::new(HealthChecker::new(
        pool.clone(),
        settings.request_log.base_dir.clone(),
    ));
    let log_health = health_checker.check_log_dir();
    if !log_health.status.is_healthy() {
        warn!(detail = ?log_health.message, "Request log directory is not writable");
    }

    let state = AppState::new(pool, logger.clone())
        .with_metrics(metrics_handle)
        .with_health_checker(health_checker);
    let app = create_router(
        state,
        Duration::from_secs(settings.application.request_timeout_secs),
    );

    let address = settings.application.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "HTTP server starting");
    logger.log(
        None,
        SYSTEM_MODULE,
        LogLevel::Info,
        format!("Servidor escuchando en {}", address),
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    logger.log(None, SYSTEM_MODULE, LogLevel::Info, "Servidor detenido");
    info!("HTTP server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
