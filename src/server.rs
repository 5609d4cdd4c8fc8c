//! HTTP API consumed by the calculator front end
//!
//! - `GET /api/vlsfo-price` always answers 200 with a [`PriceQueryResult`];
//!   estimation failures are reported inside the body.
//! - `POST /api/calculate` answers 200 with a [`CalculationResult`] or 400
//!   with `{"error": message}`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::calculator::{calculate, CalculateRequest, CalculationResult};
use crate::data::PriceQueryResult;
use crate::estimator::PriceEstimator;

/// Application state shared across handlers
pub struct AppState {
    pub estimator: PriceEstimator,
}

/// Body returned with a 400 response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Builds the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/vlsfo-price", get(vlsfo_price))
        .route("/api/calculate", post(calculate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Last month's VLSFO price, or an error result with a null price
async fn vlsfo_price(State(state): State<Arc<AppState>>) -> Json<PriceQueryResult> {
    Json(state.estimator.current_price().await.into())
}

async fn calculate_handler(
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculationResult>, (StatusCode, Json<ErrorBody>)> {
    let bad_request = |error: String| {
        debug!(%error, "rejected calculation request");
        (StatusCode::BAD_REQUEST, Json(ErrorBody { error }))
    };

    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    calculate(&request)
        .map(Json)
        .map_err(|e| bad_request(e.to_string()))
}
