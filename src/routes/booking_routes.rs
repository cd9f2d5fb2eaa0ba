use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{AgencyBookingResponse, BookingQuery, CreateBookingRequest};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientIp};
use crate::models::booking::{Booking, BookingTransition};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas de reservas: el formulario público y la gestión de la agencia
pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/api/book/:vehicle_id", post(create_booking))
        .route("/api/manage-bookings", get(list_bookings))
        .route("/api/manage-bookings/:id/accept", post(accept_booking))
        .route("/api/manage-bookings/:id/decline", post(decline_booking))
        .route("/api/current-rentals", get(current_rentals))
        .route("/api/current-rentals/:id/return", post(return_vehicle))
}

async fn create_booking(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(vehicle_id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    request.validate()?;
    let response = BookingController::new(&state)
        .create(vehicle_id, request, ip)
        .await?;
    Ok(Json(response))
}

async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> Result<Json<ApiResponse<Vec<AgencyBookingResponse>>>, AppError> {
    let bookings = BookingController::new(&state)
        .list(&user, query.status)
        .await?;
    Ok(Json(ApiResponse::success(bookings)))
}

async fn current_rentals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<AgencyBookingResponse>>>, AppError> {
    let rentals = BookingController::new(&state).current_rentals(&user).await?;
    Ok(Json(ApiResponse::success(rentals)))
}

async fn accept_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, user, id, BookingTransition::Accept).await
}

async fn decline_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, user, id, BookingTransition::Decline).await
}

async fn return_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    transition(state, user, id, BookingTransition::Complete).await
}

async fn transition(
    state: AppState,
    user: AuthenticatedUser,
    id: Uuid,
    transition: BookingTransition,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let response = BookingController::new(&state)
        .transition(&user, id, transition)
        .await?;
    Ok(Json(response))
}
