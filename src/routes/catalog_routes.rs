use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::CatalogVehicleResponse;
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Catálogo público, sin autenticación
pub fn create_catalog_router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_available))
        .route("/vehicles/:id", get(get_vehicle))
}

async fn list_available(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CatalogVehicleResponse>>>, AppError> {
    let vehicles = VehicleController::new(&state).list_catalog().await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CatalogVehicleResponse>>, AppError> {
    let vehicle = VehicleController::new(&state).get_catalog(id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}
