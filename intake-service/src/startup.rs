//! Application startup and lifecycle management.

use crate::config::{IntakeConfig, ReferenceStoreBackend};
use crate::handlers;
use crate::services::{
    DocumentAnalysisProvider, EmailProvider, HttpAnalysisProvider, InMemoryReferenceStore,
    PgReferenceStore, ReferenceStore, SmtpProvider,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers around the card upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: IntakeConfig,
    pub store: Arc<dyn ReferenceStore>,
    pub analysis_provider: Arc<dyn DocumentAnalysisProvider>,
    pub email_provider: Arc<dyn EmailProvider>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/diagnosis-codes", get(handlers::diagnosis_codes::list_all))
        .route(
            "/diagnosis-codes/by-wound-types",
            post(handlers::diagnosis_codes::by_wound_types),
        )
        .route(
            "/insurance-card/analyze",
            post(handlers::insurance_card::analyze),
        )
        .route("/insurance-card/status", get(handlers::insurance_card::status))
        .route("/products/search", get(handlers::products::search))
        .route(
            "/providers/:provider_id/products",
            get(handlers::products::provider_products),
        )
        .route(
            "/admin/notifications/email",
            post(handlers::notifications::send_admin_email),
        )
        .route_layer(from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
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
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn connect_store(config: &IntakeConfig) -> Result<Arc<dyn ReferenceStore>, AppError> {
    match config.reference_store {
        ReferenceStoreBackend::Memory => {
            tracing::info!("Using in-memory reference store");
            Ok(Arc::new(InMemoryReferenceStore::seeded()))
        }
        ReferenceStoreBackend::Postgres => {
            let store = PgReferenceStore::connect(
                config.database.url.expose_secret(),
                config.database.max_connections,
                config.database.min_connections,
                Duration::from_secs(config.database.acquire_timeout_secs),
            )
            .await
            .inspect_err(|e| tracing::error!("Failed to connect to PostgreSQL: {}", e))?;

            store
                .run_migrations()
                .await
                .inspect_err(|e| tracing::error!("Failed to run migrations: {}", e))?;

            Ok(Arc::new(store))
        }
    }
}

fn analysis_provider(config: &IntakeConfig) -> Result<Arc<dyn DocumentAnalysisProvider>, AppError> {
    let provider = HttpAnalysisProvider::new(config.analysis.clone()).map_err(|e| {
        tracing::error!("Failed to initialize document analysis provider: {}", e);
        AppError::ConfigError(anyhow::anyhow!(e))
    })?;

    if provider.is_configured() {
        tracing::info!("Document analysis provider initialized");
    } else {
        tracing::warn!("Document analysis disabled or not configured - card analysis will be unavailable");
    }

    Ok(Arc::new(provider))
}

fn email_provider(config: &IntakeConfig) -> Result<Arc<dyn EmailProvider>, AppError> {
    let provider = SmtpProvider::new(config.smtp.clone()).map_err(|e| {
        tracing::error!("Failed to initialize SMTP provider: {}", e);
        AppError::ConfigError(anyhow::anyhow!(e))
    })?;

    if provider.is_enabled() {
        tracing::info!("SMTP email provider initialized");
    } else {
        tracing::warn!("SMTP disabled - admin notifications will be reported as failed");
    }

    Ok(Arc::new(provider))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: IntakeConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;

        let state = AppState {
            analysis_provider: analysis_provider(&config)?,
            email_provider: email_provider(&config)?,
            store,
            config,
        };

        Self::with_state(state).await
    }

    /// Bind a listener for an already assembled state.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Intake service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
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
