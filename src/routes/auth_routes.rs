use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{CurrentUserResponse, SignInRequest, SignUpRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::session_service::Session;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Configura las rutas de autenticación
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
        .route("/me", get(current_user))
}

async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    request.validate()?;
    let response = AuthController::new(&state).sign_up(request).await?;
    Ok(Json(response))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    request.validate()?;
    let response = AuthController::new(&state).sign_in(request).await?;
    Ok(Json(response))
}

async fn sign_out(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<ApiResponse<()>> {
    Json(AuthController::new(&state).sign_out(&user).await)
}

async fn current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<CurrentUserResponse>>, AppError> {
    let response = AuthController::new(&state).current_user(user).await?;
    Ok(Json(response))
}
