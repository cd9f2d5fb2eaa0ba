use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserType;
use crate::services::session_service::{AgencySignUp, SignUpCommand};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::non_empty;

// Metadata opcional del alta
#[derive(Debug, Deserialize, Default)]
pub struct SignUpMetadata {
    pub user_type: Option<UserType>,
    pub company_name: Option<String>,
}

// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(default)]
    pub metadata: Option<SignUpMetadata>,
}

impl SignUpRequest {
    /// Una agencia necesita `company_name`
    pub fn into_command(self) -> AppResult<SignUpCommand> {
        let metadata = self.metadata.unwrap_or_default();
        let agency = match metadata.user_type {
            Some(UserType::Agency) => {
                let company_name = non_empty(metadata.company_name).ok_or_else(|| {
                    validation_error("company_name", "Company name is required for agencies")
                })?;
                Some(AgencySignUp { company_name })
            }
            _ => None,
        };

        Ok(SignUpCommand {
            email: self.email,
            password: self.password,
            agency,
        })
    }
}

// Sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Usuario actual
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub agency_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    #[test]
    fn test_agency_metadata_requires_company_name() {
        let request: SignUpRequest = serde_json::from_value(serde_json::json!({
            "email": "ops@fleet.test",
            "password": "secret1",
            "metadata": { "user_type": "agency", "company_name": "  " }
        }))
        .unwrap();

        assert!(matches!(request.into_command(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_plain_sign_up_is_renter() {
        let request: SignUpRequest = serde_json::from_value(serde_json::json!({
            "email": "renter@example.com",
            "password": "secret1"
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert!(request.into_command().unwrap().agency.is_none());
    }
}
