use axum::{
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod cloudinary;
mod config;
mod db;
mod error;
mod handlers;
mod keepalive;
mod models;
mod system_info;

#[cfg(test)]
mod tests;

use auth::Authenticator;
use cloudinary::{CloudinaryClient, MediaHost};
use config::Config;
use db::{PgVideoStore, VideoStore};
use handlers::{delete_handler, keep_alive_handler, upload_handler, upload_page};
use models::AppState;

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/video-upload", post(upload_handler).delete(delete_handler))
        .route("/api/keep-alive", get(keep_alive_handler))
        .route("/", get(upload_page))
        .route("/video-upload", get(upload_page))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("video_upload_backend=debug,tower_http=debug")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;

    let auth = Authenticator::from_config(&config.auth)?;
    system_info::print_startup_info(&config, auth.is_configured());

    if !auth.is_configured() {
        warn!("No session verification key configured, every authenticated request will be rejected");
    }

    let store = PgVideoStore::connect_lazy(&config.database)?;
    if config.database.run_migrations {
        store.migrate().await?;
        info!("✅ Database migrations applied");
    }
    let store: Arc<dyn VideoStore> = Arc::new(store);

    let media: Option<Arc<dyn MediaHost>> = match config.cloudinary.credentials() {
        Some(credentials) => Some(Arc::new(CloudinaryClient::new(
            &config.cloudinary,
            credentials,
            Duration::from_secs(config.limits.upload_timeout),
        )?)),
        None => {
            warn!("Cloudinary credentials not found, uploads and deletes will fail");
            None
        }
    };

    if config.limits.keep_alive_interval > 0 {
        keepalive::start_keep_alive_task(
            store.clone(),
            Duration::from_secs(config.limits.keep_alive_interval),
        );
    }

    let addr = format!("{}:{}", config.host, config.port);

    let app_state = Arc::new(AppState {
        store,
        media,
        auth,
        config,
    });

    let app = app(app_state);

    info!("🚀 Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✅ Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
