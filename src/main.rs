//! Static HTML importer - server entry point

use anyhow::Result;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use static_html_importer::{
    api::{self, AppState},
    config::Config,
    db::{self, repositories::SqlxPageRepository},
    services::{AdminAuthorizer, Importer, NonceService, PageService},
    views::Views,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "static_html_importer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting static HTML importer...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    // Services
    let page_service = Arc::new(PageService::new(SqlxPageRepository::boxed(pool.clone())));
    let importer = Arc::new(Importer::new(page_service.clone()));

    let nonce_secret = if config.security.nonce_secret.is_empty() {
        tracing::warn!("No nonce secret configured; using a random one, nonces will not survive a restart");
        let mut secret = vec![0u8; 32];
        OsRng.fill_bytes(&mut secret);
        secret
    } else {
        config.security.nonce_secret.as_bytes().to_vec()
    };
    let nonce = Arc::new(NonceService::new(
        &nonce_secret,
        config.security.nonce_lifetime_secs,
    )?);

    let authorizer = Arc::new(AdminAuthorizer::new(config.security.admin_token_hash.clone()));
    let views = Arc::new(Views::new()?);

    let state = AppState {
        pool: pool.clone(),
        page_service,
        importer,
        nonce,
        authorizer,
        views,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
