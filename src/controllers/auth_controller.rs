use std::sync::Arc;

use crate::dto::auth_dto::{CurrentUserResponse, SignInRequest, SignUpRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::repositories::{AgencyRepository, RecordStore};
use crate::services::clock::Clock;
use crate::services::session_service::{AuthService, Session};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct AuthController {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    auth: AuthService,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            auth: state.auth.clone(),
        }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<ApiResponse<Session>, AppError> {
        let command = request.into_command()?;
        let session = self
            .auth
            .sign_up(&*self.store, command, self.clock.now())
            .await?;

        Ok(ApiResponse::success_with_message(session, "Account created"))
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<ApiResponse<Session>, AppError> {
        let session = self
            .auth
            .sign_in(&*self.store, &request.email, &request.password)
            .await?;

        Ok(ApiResponse::success(session))
    }

    pub async fn sign_out(&self, user: &AuthenticatedUser) -> ApiResponse<()> {
        self.auth.sign_out(user).await;
        ApiResponse::message("Signed out")
    }

    pub async fn current_user(
        &self,
        user: AuthenticatedUser,
    ) -> Result<ApiResponse<CurrentUserResponse>, AppError> {
        let agency_id = self
            .store
            .find_agency_by_user(user.user_id)
            .await?
            .map(|a| a.id);

        Ok(ApiResponse::success(CurrentUserResponse {
            user_id: user.user_id,
            email: user.email,
            user_type: user.user_type,
            agency_id,
        }))
    }
}
