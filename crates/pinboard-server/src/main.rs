mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pinboard_api::auth::{AdminAuth, AppState, AppStateInner};
use pinboard_api::storage::BlobStorage;
use pinboard_db::Database;
use pinboard_review::ReviewService;

use crate::config::{AdminCredential, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinboard=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let jwt_secret = match config.jwt_secret.clone() {
        Some(secret) => secret,
        None => {
            warn!("PINBOARD_JWT_SECRET unset; generated a per-process secret, tokens will not survive a restart");
            hex::encode(rand::random::<[u8; 32]>())
        }
    };
    let token_ttl = chrono::Duration::hours(config.token_ttl_hours);

    let admin = match &config.admin {
        AdminCredential::Hash(hash) => AdminAuth::from_hash(hash.clone(), jwt_secret, token_ttl)?,
        AdminCredential::Password(password) => {
            if config.uses_default_password() {
                warn!("Using the default admin password; set PINBOARD_ADMIN_PASSWORD");
            }
            AdminAuth::from_password(password, jwt_secret, token_ttl)?
        }
    };

    let db = Database::open(&config.db_path)?;
    let storage = BlobStorage::new(config.upload_dir.clone()).await?;

    let state: AppState = Arc::new(AppStateInner {
        review: ReviewService::new(db),
        storage,
        admin,
    });

    let mut app = pinboard_api::router(state);
    if config.static_dir.is_dir() {
        info!("Serving static files from {}", config.static_dir.display());
        app = app.fallback_service(ServeDir::new(&config.static_dir));
    }
    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Pinboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
