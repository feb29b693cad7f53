//! HTTP integration layer for the wildfire-risk prediction engine.
//!
//! All request validation happens here, before any model is invoked. The
//! registry is built once in [`run_server`] and shared read-only through
//! [`AppState`].

pub mod config;
pub mod predict_routes;
pub mod request;

#[cfg(test)]
mod route_tests;

use axum::{
    http::{header, HeaderName, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pyroscan_core::CoreError;
use pyroscan_models::{load_models, ModelError, ModelRegistry};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use config::ServerConfig;

/// Process-scoped state, cloned cheaply into every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub config: Arc<ServerConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(registry: ModelRegistry, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

/// Error returned by handlers: an HTTP status plus a message rendered as
/// `{"ok": false, "error": "..."}`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", self.status, self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }
        let body = serde_json::json!({
            "ok": false,
            "error": self.error.to_string(),
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<CoreError> for AppError {
    fn from(error: CoreError) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, error.into())
    }
}

impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        let status = match &error {
            ModelError::Core(_) => StatusCode::BAD_REQUEST,
            ModelError::NoModelsAvailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, error.into())
    }
}

/// Correlates log lines with responses. An incoming id is kept, otherwise a
/// UUID v4 is minted; either way it is echoed on the response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Full router with CORS, request ids and HTTP tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    // Outermost last: ids are assigned before the trace span opens.
    predict_routes::predict_routes()
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(trace)
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// `RUST_LOG` filter (default `info`); JSON lines when `RUST_LOG_FORMAT=json`.
pub fn init_tracing() {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let registry = load_models(&config.models_dir).with_default_model(config.default_model.clone());
    tracing::info!(
        "Loaded {} model(s) from {} (default={}, null-model policy={})",
        registry.len(),
        config.models_dir.display(),
        config.default_model,
        config.null_model_policy
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(AppState::new(registry, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("PyroScan prediction API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
