use std::sync::Arc;

use tracing::info;

use crate::dto::agency_dto::{CreateAgencyRequest, DashboardSummary, UpdateAgencyRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::agency::{Agency, NewAgency};
use crate::repositories::{AgencyRepository, RecordStore, VehicleRepository};
use crate::services::clock::Clock;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::non_empty;

pub struct AgencyController {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl AgencyController {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
        }
    }

    /// Registrar la agencia de un usuario que todavía no tiene una
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateAgencyRequest,
    ) -> Result<ApiResponse<Agency>, AppError> {
        if self.store.find_agency_by_user(user.user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "An agency is already registered for this account".to_string(),
            ));
        }

        let agency = self
            .store
            .insert_agency(NewAgency {
                user_id: user.user_id,
                company_name: request.company_name.trim().to_string(),
                contact_email: non_empty(request.contact_email).unwrap_or_else(|| user.email.clone()),
                contact_phone: non_empty(request.contact_phone),
                address: non_empty(request.address),
                city: non_empty(request.city),
                state: non_empty(request.state),
                postal_code: non_empty(request.postal_code),
                website: non_empty(request.website),
                description: non_empty(request.description),
                created_at: self.clock.now(),
            })
            .await?;

        info!(agency_id = %agency.id, user_id = %user.user_id, "🏢 Agency registered");
        Ok(ApiResponse::success_with_message(agency, "Agency registered"))
    }

    pub async fn get_own(&self, user: &AuthenticatedUser) -> Result<ApiResponse<Agency>, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;
        Ok(ApiResponse::success(agency))
    }

    pub async fn update_own(
        &self,
        user: &AuthenticatedUser,
        request: UpdateAgencyRequest,
    ) -> Result<ApiResponse<Agency>, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;

        let updated = self
            .store
            .update_agency(agency.id, request.into(), self.clock.now())
            .await?
            .ok_or_else(|| AppError::NotFound("Agency not found".to_string()))?;

        Ok(ApiResponse::success_with_message(updated, "Agency profile updated"))
    }

    /// Totales de la flota para el dashboard
    pub async fn dashboard(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<DashboardSummary>, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;
        let fleet = self.store.list_vehicles_by_agency(agency.id).await?;

        let summary = DashboardSummary::from_rates(
            agency.id,
            agency.company_name,
            fleet.iter().map(|v| (v.daily_rate, v.is_available)),
        );

        Ok(ApiResponse::success(summary))
    }
}
