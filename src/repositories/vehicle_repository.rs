use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleSpec};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    /// Flota de una agencia, más recientes primero
    async fn list_vehicles_by_agency(&self, agency_id: Uuid) -> AppResult<Vec<Vehicle>>;

    /// Catálogo público: vehículos con `is_available = true`
    async fn list_available_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    async fn update_vehicle(
        &self,
        id: Uuid,
        spec: VehicleSpec,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>>;

    /// Override manual del operador sobre el flag de disponibilidad
    async fn set_vehicle_availability(
        &self,
        id: Uuid,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>>;

    /// `Conflict` si el vehículo tiene historial de reservas
    async fn delete_vehicle(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
impl VehicleRepository for PgStore {
    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let spec = vehicle.spec;
        let result = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, agency_id, make, model, year, vehicle_type, transmission, fuel_type,
                seats, daily_rate, weekly_rate, monthly_rate, image_url, license_plate,
                vin, features, is_available, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle.agency_id)
        .bind(spec.make)
        .bind(spec.model)
        .bind(spec.year)
        .bind(spec.vehicle_type)
        .bind(spec.transmission)
        .bind(spec.fuel_type)
        .bind(spec.seats)
        .bind(spec.daily_rate)
        .bind(spec.weekly_rate)
        .bind(spec.monthly_rate)
        .bind(spec.image_url)
        .bind(spec.license_plate)
        .bind(spec.vin)
        .bind(spec.features)
        .bind(vehicle.is_available)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn list_vehicles_by_agency(&self, agency_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE agency_id = $1 ORDER BY created_at DESC",
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn list_available_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE is_available ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        spec: VehicleSpec,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET make = $2, model = $3, year = $4, vehicle_type = $5, transmission = $6,
                fuel_type = $7, seats = $8, daily_rate = $9, weekly_rate = $10,
                monthly_rate = $11, image_url = $12, license_plate = $13, vin = $14,
                features = $15, updated_at = $16
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(spec.make)
        .bind(spec.model)
        .bind(spec.year)
        .bind(spec.vehicle_type)
        .bind(spec.transmission)
        .bind(spec.fuel_type)
        .bind(spec.seats)
        .bind(spec.daily_rate)
        .bind(spec.weekly_rate)
        .bind(spec.monthly_rate)
        .bind(spec.image_url)
        .bind(spec.license_plate)
        .bind(spec.vin)
        .bind(spec.features)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn set_vehicle_availability(
        &self,
        id: Uuid,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET is_available = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_available)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn delete_vehicle(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
