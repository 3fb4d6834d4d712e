use crate::config::Config;
use crate::images::GalleryService;
use crate::media_store::build_media_store;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod request_id;
pub mod routes_images;

pub use error::AppError;
pub use request_id::{RequestId, X_REQUEST_ID};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub gallery: Arc<GalleryService>,
}

impl AppContext {
    pub fn new(config: Config, gallery: GalleryService) -> Self {
        Self {
            config: Arc::new(config),
            gallery: Arc::new(gallery),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(ctx.config.server.max_upload_bytes);

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_images::image_routes())
        .layer(body_limit)
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Build the shared handles and start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let db_path = config.server.db_path.to_string_lossy().into_owned();
    let pool = gallery_db::pool::init_pool(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    let store = build_media_store(&config.media_store).context("Failed to set up media store")?;
    tracing::info!(
        store = store.name(),
        folder = %config.media_store.folder,
        db = %db_path,
        "Gallery storage ready"
    );

    let gallery = GalleryService::new(store, pool, config.media_store.folder.clone());
    let app = create_router(AppContext::new(config, gallery));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
