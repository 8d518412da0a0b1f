use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use gatekeeper::server::{
    config::Config,
    dynamic::DynamicConfig,
    error::AppError,
    router,
    scheduler::config_refresh,
    service::{
        configuration::ConfigurationService,
        http_client::HttpClient,
        location::LOCATION_SERVICE,
    },
    startup,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = startup::connect_to_database(&config).await?;
    let session = startup::connect_to_session(&db).await?;
    let http_client = startup::setup_reqwest_client()?;

    let (api, routes) = router::api_router().into_parts();
    let dynamic = Arc::new(DynamicConfig::new(
        routes.keys(),
        startup::setup_signed_keys(&config),
        config.script_max_operations,
    ));

    // Initial refresh before serving; a failure keeps the unconfigured defaults
    if let Err(e) = ConfigurationService::new(&db)
        .refresh(&dynamic, config.refresh_timeout)
        .await
    {
        tracing::error!("Initial configuration refresh failed: {}", e);
    }

    let _scheduler = config_refresh::start_scheduler(
        db.clone(),
        dynamic.clone(),
        &config.refresh_cron,
        config.refresh_timeout,
    )
    .await?;

    let location = HttpClient::new(
        http_client,
        LOCATION_SERVICE,
        &config.location_url,
        dynamic.clone(),
    );
    let state = AppState::new(
        db,
        dynamic,
        Arc::new(routes),
        location,
        config.refresh_timeout,
    );
    let app = router::router(api, state, session);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind {}: {}", config.bind_addr, e)))?;

    tracing::info!("Starting server on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::InternalError(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
