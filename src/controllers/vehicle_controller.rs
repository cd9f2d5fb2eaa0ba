use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::dto::vehicle_dto::{CatalogVehicleResponse, VehicleRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle::{NewVehicle, Vehicle};
use crate::repositories::{AgencyRepository, RecordStore, VehicleRepository};
use crate::services::clock::Clock;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct VehicleController {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
        }
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: VehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;
        let is_available = request.is_available.unwrap_or(true);

        let vehicle = self
            .store
            .insert_vehicle(NewVehicle {
                agency_id: agency.id,
                spec: request.into_spec(),
                is_available,
                created_at: self.clock.now(),
            })
            .await?;

        info!(vehicle_id = %vehicle.id, agency_id = %agency.id, "🚗 Vehicle added: {}", vehicle.display_name());
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle added"))
    }

    /// Flota propia, más recientes primero
    pub async fn list_own(&self, user: &AuthenticatedUser) -> Result<Vec<Vehicle>, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;
        self.store.list_vehicles_by_agency(agency.id).await
    }

    pub async fn get_own(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Vehicle, AppError> {
        self.owned_vehicle(user, id).await
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: VehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        self.owned_vehicle(user, id).await?;

        let vehicle = self
            .store
            .update_vehicle(id, request.into_spec(), self.clock.now())
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        Ok(ApiResponse::success_with_message(vehicle, "Vehicle updated"))
    }

    /// Override manual del flag de disponibilidad; siempre permitido
    pub async fn set_availability(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        is_available: bool,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        let current = self.owned_vehicle(user, id).await?;

        let vehicle = self
            .store
            .set_vehicle_availability(id, is_available, self.clock.now())
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        info!(
            vehicle_id = %id,
            user_id = %user.user_id,
            previous = current.is_available,
            new = vehicle.is_available,
            "🔧 Manual availability override"
        );
        Ok(ApiResponse::success(vehicle))
    }

    /// Borrar un vehículo sin historial de reservas
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.owned_vehicle(user, id).await?;

        if !self.store.delete_vehicle(id).await? {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        info!(vehicle_id = %id, user_id = %user.user_id, "🗑️ Vehicle deleted");
        Ok(ApiResponse::message("Vehicle deleted"))
    }

    /// Catálogo público
    pub async fn list_catalog(&self) -> Result<Vec<CatalogVehicleResponse>, AppError> {
        let vehicles = self.store.list_available_vehicles().await?;
        Ok(vehicles.into_iter().map(Into::into).collect())
    }

    /// Detalle para la página de reserva; también si ya no está disponible
    pub async fn get_catalog(&self, id: Uuid) -> Result<CatalogVehicleResponse, AppError> {
        let vehicle = self
            .store
            .find_vehicle(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
        Ok(vehicle.into())
    }

    async fn owned_vehicle(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Vehicle, AppError> {
        let agency = self.store.require_agency_of(user.user_id).await?;
        let vehicle = self
            .store
            .find_vehicle(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.agency_id != agency.id {
            return Err(AppError::Forbidden(
                "This vehicle belongs to another agency".to_string(),
            ));
        }
        Ok(vehicle)
    }
}
