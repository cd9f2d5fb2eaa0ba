//! Router HTTP
//!
//! Monta todas las rutas sobre `AppState` con las capas comunes: trazas,
//! timeout por request (408) y CORS.

pub mod agency_routes;
pub mod auth_routes;
pub mod booking_routes;
pub mod catalog_routes;
pub mod vehicle_routes;

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::cors_layer;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api/auth", auth_routes::create_auth_router())
        .nest("/api/agency", agency_routes::create_agency_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/catalog", catalog_routes::create_catalog_router())
        .merge(booking_routes::create_booking_router())
        .fallback(not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "rental_hub",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(format!("Metrics encoding failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
