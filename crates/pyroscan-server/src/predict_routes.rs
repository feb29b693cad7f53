use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pyroscan_core::{classify::RISK_THRESHOLDS, RiskScheme, TileRecord};
use pyroscan_models::hashing::round_to;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::request::{parse_batch_request, parse_day_value, parse_scheme};
use crate::{AppError, AppState};

// ─── Query params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub tile: Option<String>,
    pub day: Option<String>,
    pub model: Option<String>,
    pub scheme: Option<String>,
}

// ─── Response types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub ok: bool,
    pub tile: String,
    pub day: u8,
    pub model: Option<String>,
    pub requested_model: String,
    pub confidence: Option<f64>,
    pub category: &'static str,
    pub scheme: RiskScheme,
}

#[derive(Debug, Serialize)]
pub struct TileResult {
    pub tile: String,
    pub confidence: Option<f64>,
    pub category: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub ok: bool,
    pub model: Option<String>,
    pub requested_model: String,
    pub day: u8,
    pub count: usize,
    pub scheme: RiskScheme,
    pub results: Vec<TileResult>,
}

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/models", get(list_models).fallback(method_not_allowed))
        .route(
            "/predict",
            get(predict).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/predict_batch",
            post(predict_batch)
                .options(preflight)
                .fallback(method_not_allowed),
        )
}

async fn method_not_allowed() -> AppError {
    AppError::with_status(
        StatusCode::METHOD_NOT_ALLOWED,
        anyhow::anyhow!("method not allowed"),
    )
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn index() -> Json<Value> {
    let thresholds: Vec<Value> = RISK_THRESHOLDS
        .iter()
        .map(|(category, lower, upper)| {
            json!({ "category": category.label(), "min": lower, "max": upper })
        })
        .collect();

    Json(json!({
        "service": "PyroScan Prediction API",
        "endpoints": {
            "health": "GET /health",
            "models": "GET /models",
            "predict": "GET /predict?tile=z/x/y&day=0&model=<name>&scheme=tiered|legacy",
            "predict_batch": "POST /predict_batch",
        },
        "thresholds": thresholds,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "models_loaded": state.registry.len(),
        "models": state.registry.names(),
        "models_dir": state.config.models_dir.display().to_string(),
        "default_model": state.registry.default_model(),
        "null_model_policy": state.config.null_model_policy,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

async fn list_models(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "models": state.registry.names() }))
}

/// GET /predict?tile=z/x/y&day=N&model=name&scheme=tiered|legacy
async fn predict(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tile_id = query
        .tile
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("tile query param is required (format: z/x/y)"))?;
    let tile = TileRecord::new(tile_id)?;
    let day = parse_day_value(query.day.map(Value::String).as_ref())?;
    let scheme = match query.scheme.as_deref() {
        Some(s) => parse_scheme(s)?,
        None => state.config.default_scheme,
    };

    let prediction = state.registry.predict_tile(
        query.model.as_deref(),
        &tile,
        day,
        state.config.null_model_policy,
    )?;
    tracing::debug!(
        "Predicted tile {} day {} with {:?}: {:?}",
        tile.id,
        day,
        prediction.model,
        prediction.confidence
    );

    let decimals = state.config.confidence_decimals;
    Ok(Json(PredictResponse {
        ok: true,
        tile: tile.id,
        day: day.get(),
        model: prediction.model,
        requested_model: prediction.requested_model,
        confidence: prediction.confidence.map(|c| round_to(c, decimals)),
        category: scheme.classify(prediction.confidence),
        scheme,
    }))
}

/// POST /predict_batch
async fn predict_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchResponse>, AppError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::bad_request("JSON body is required"))?;
    let request = parse_batch_request(&payload)?;
    let scheme = request.scheme.unwrap_or(state.config.default_scheme);
    let policy = state.config.null_model_policy;

    let registry = state.registry.clone();
    let model = request.model.clone();
    let day = request.day;
    let tiles = request.tiles;
    let (tiles, prediction) = tokio::task::spawn_blocking(move || {
        let prediction = registry.predict_batch(model.as_deref(), &tiles, day, policy);
        (tiles, prediction)
    })
    .await
    .map_err(|e| anyhow::anyhow!("prediction task failed: {e}"))?;
    let prediction = prediction?;

    tracing::debug!(
        "Scored {} tile(s) for day {} with {:?}",
        tiles.len(),
        day,
        prediction.model
    );

    let decimals = state.config.confidence_decimals;
    let results: Vec<TileResult> = tiles
        .into_iter()
        .zip(prediction.confidences)
        .map(|(tile, confidence)| TileResult {
            tile: tile.id,
            confidence: confidence.map(|c| round_to(c, decimals)),
            category: scheme.classify(confidence),
        })
        .collect();

    Ok(Json(BatchResponse {
        ok: true,
        model: prediction.model,
        requested_model: prediction.requested_model,
        day: prediction.day.get(),
        count: results.len(),
        scheme,
        results,
    }))
}
