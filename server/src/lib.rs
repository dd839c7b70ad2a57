//! ratesvc HTTP Transport
//!
//! Thin axum layer over the rate engine: raw query in, JSON body and
//! status code out. All decision logic lives in `ratesvc-rates`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use ratesvc_rates::{RateCache, RateResolver, RatesError, RequestValidator};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod config;

/// Shared per-request state.
#[derive(Clone)]
pub struct AppState {
    /// The live snapshot cache, read by every request.
    pub cache: Arc<RateCache>,
    /// The resolver answering validated requests.
    pub resolver: Arc<RateResolver>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rates", get(rates))
        .route("/health-check", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

async fn rates(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let raw = query.unwrap_or_default();

    let request = match RequestValidator::new(&state.cache).validate(&raw) {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };

    match state.resolver.resolve(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "alive": true })))
}

/// Serialize an engine error as `{"error": message}` with its status.
fn error_response(err: RatesError) -> Response {
    let status = match err {
        RatesError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::warn!(error = %err, status = %status, "Request rejected");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
