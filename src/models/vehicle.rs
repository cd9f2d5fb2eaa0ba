//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus enums de catálogo.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.
//! `is_available` es la única fuente de verdad sobre si el vehículo
//! se puede reservar; no se deriva de las reservas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Categoría del vehículo - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Economy,
    Compact,
    Midsize,
    Fullsize,
    Luxury,
    Suv,
    Truck,
    Van,
}

/// Transmisión - mapea al ENUM transmission_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "transmission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

/// Combustible - mapea al ENUM fuel_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "fuel_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: i32,
    pub daily_rate: Decimal,
    pub weekly_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub image_url: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
    pub features: Option<Vec<String>>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// "2023 Toyota Camry"
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// Atributos editables por el operador (alta y edición completa)
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: i32,
    pub daily_rate: Decimal,
    pub weekly_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub image_url: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
    pub features: Option<Vec<String>>,
}

impl VehicleSpec {
    pub fn apply_to(self, vehicle: &mut Vehicle, now: DateTime<Utc>) {
        vehicle.make = self.make;
        vehicle.model = self.model;
        vehicle.year = self.year;
        vehicle.vehicle_type = self.vehicle_type;
        vehicle.transmission = self.transmission;
        vehicle.fuel_type = self.fuel_type;
        vehicle.seats = self.seats;
        vehicle.daily_rate = self.daily_rate;
        vehicle.weekly_rate = self.weekly_rate;
        vehicle.monthly_rate = self.monthly_rate;
        vehicle.image_url = self.image_url;
        vehicle.license_plate = self.license_plate;
        vehicle.vin = self.vin;
        vehicle.features = self.features;
        vehicle.updated_at = now;
    }
}

/// Fila a insertar en vehicles
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub agency_id: Uuid,
    pub spec: VehicleSpec,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: Uuid) -> Vehicle {
        let spec = self.spec;
        Vehicle {
            id,
            agency_id: self.agency_id,
            make: spec.make,
            model: spec.model,
            year: spec.year,
            vehicle_type: spec.vehicle_type,
            transmission: spec.transmission,
            fuel_type: spec.fuel_type,
            seats: spec.seats,
            daily_rate: spec.daily_rate,
            weekly_rate: spec.weekly_rate,
            monthly_rate: spec.monthly_rate,
            image_url: spec.image_url,
            license_plate: spec.license_plate,
            vin: spec.vin,
            features: spec.features,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
