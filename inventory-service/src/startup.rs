//! Application startup and lifecycle management.

use crate::config::{InventoryConfig, StoreBackend};
use crate::handlers;
use crate::services::{InMemoryProductRepository, MongoDb, MongoProductRepository, ProductRepository};
use axum::{
    extract::Request,
    middleware::from_fn,
    routing::get,
    Router, ServiceExt,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: InventoryConfig,
    pub repository: Arc<dyn ProductRepository>,
}

impl AppState {
    pub fn new(config: InventoryConfig, repository: Arc<dyn ProductRepository>) -> Self {
        Self { config, repository }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/inventory",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/inventory/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// The router wrapped so `/inventory/` and `/inventory` route identically.
/// Path rewriting has to happen before routing, hence outside the router.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect the product store and bind the listener. Port 0 picks a free
    /// port.
    pub async fn build(config: InventoryConfig) -> Result<Self, AppError> {
        let repository = build_repository(&config).await?;
        let state = AppState::new(config.clone(), repository);

        let address = config.common.listen_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Inventory service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = build_app(self.state);

        axum::serve(
            self.listener,
            ServiceExt::<Request>::into_make_service(app),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn build_repository(
    config: &InventoryConfig,
) -> Result<Arc<dyn ProductRepository>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory product store; data is lost on restart");
            Ok(Arc::new(InMemoryProductRepository::new()))
        }
        StoreBackend::Mongodb => {
            let mongo = &config.store.mongodb;
            let db = MongoDb::connect(mongo.uri.expose_secret(), &mongo.database).await?;
            let repository =
                MongoProductRepository::new(db, &mongo.collection, mongo.operation_timeout());

            repository.health_check().await.map_err(|e| {
                tracing::error!("MongoDB is not reachable: {}", e);
                e
            })?;
            repository.initialize_indexes().await?;

            tracing::info!(
                database = %mongo.database,
                collection = %mongo.collection,
                "Product store ready"
            );
            Ok(Arc::new(repository))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
