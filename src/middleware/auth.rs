//! Autenticación por bearer token
//!
//! `AuthenticatedUser` es un extractor: los handlers protegidos lo reciben
//! como argumento y el resto del sistema sólo ve `{ user_id, email }`.
//! El token se lee del header `Authorization`; para el WebSocket del
//! dashboard (los navegadores no pueden fijar headers) también del query
//! `access_token`.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use uuid::Uuid;

use crate::{
    models::user::UserType,
    state::AppState,
    utils::{errors::AppError, jwt::extract_token_from_header},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub user_type: UserType,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
                extract_token_from_header(value)?.to_string()
            }
            None => query_token(parts.uri.query()).ok_or_else(|| {
                AppError::Unauthorized("Authorization token required".to_string())
            })?,
        };

        state.auth.current_user(&token).await
    }
}

fn query_token(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "access_token")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
