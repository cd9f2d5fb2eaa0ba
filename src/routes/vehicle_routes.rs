use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{AvailabilityRequest, VehicleRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Flota de la agencia autenticada
pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/availability", post(set_availability))
}

async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    request.validate()?;
    let response = VehicleController::new(&state).create(&user, request).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let vehicles = VehicleController::new(&state).list_own(&user).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let vehicle = VehicleController::new(&state).get_own(&user, id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    request.validate()?;
    let response = VehicleController::new(&state).update(&user, id, request).await?;
    Ok(Json(response))
}

async fn set_availability(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let response = VehicleController::new(&state)
        .set_availability(&user, id, request.is_available)
        .await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = VehicleController::new(&state).delete(&user, id).await?;
    Ok(Json(response))
}
