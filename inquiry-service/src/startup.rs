//! Application startup and lifecycle management.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, InquiryConfig, StoreBackend, StoreConfig};
use crate::handlers;
use crate::services::{InMemoryStore, MongoStore, StoreHandle, StoreState};

/// Shared application state. Built once; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub config: InquiryConfig,
    pub store: StoreHandle,
}

/// Resolve the configured backend into a store handle.
///
/// A missing or unusable connection string leaves the handle unconfigured so
/// the service can still answer liveness and health probes.
pub async fn connect_store(config: &InquiryConfig) -> StoreHandle {
    let store_config = &config.store;

    match store_config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory document store");
            let handle =
                StoreHandle::configuring(Arc::new(InMemoryStore::new(&store_config.database)));
            handle.verify().await;
            handle
        }
        StoreBackend::Mongo => connect_mongo(store_config).await,
    }
}

async fn connect_mongo(store_config: &StoreConfig) -> StoreHandle {
    let Some(uri) = &store_config.uri else {
        tracing::warn!("MONGODB_URI not set; document store is unconfigured");
        return StoreHandle::unconfigured();
    };

    let store = match MongoStore::connect(uri.expose_secret(), &store_config.database).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Document store left unconfigured: {}", e);
            return StoreHandle::unconfigured();
        }
    };

    let handle = StoreHandle::configuring(Arc::new(store.clone()));
    if handle.verify().await == StoreState::Connected {
        if let Err(e) = store.initialize_indexes(&store_config.collection).await {
            tracing::warn!("Continuing without indexes: {}", e);
        }
    }
    handle
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    if cors.allowed_origins.is_empty() {
        return layer.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let inquiry_routes = Router::new()
        .route(
            "/inquiries",
            get(handlers::list_inquiries).post(handlers::create_inquiry),
        )
        .route("/inquiries/:id", get(handlers::get_inquiry));

    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/test", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(inquiry_routes.clone())
        .nest("/api", inquiry_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

pub async fn shutdown_signal() {
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

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InquiryConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await;
        tracing::info!(state = %store.state(), "Document store initialized");

        let state = AppState {
            config: config.clone(),
            store,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Inquiry service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &StoreHandle {
        &self.state.store
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
