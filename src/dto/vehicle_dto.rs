use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{FuelType, Transmission, Vehicle, VehicleSpec, VehicleType};
use crate::utils::validation::{
    non_empty, validate_license_plate, validate_not_blank, validate_rate, validate_vin,
};

// Request para crear o editar un vehículo (edición completa)
#[derive(Debug, Deserialize, Validate)]
pub struct VehicleRequest {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub make: String,
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    #[validate(range(min = 1, max = 50))]
    pub seats: i32,
    #[validate(custom = "validate_rate")]
    pub daily_rate: Decimal,
    #[validate(custom = "validate_rate")]
    pub weekly_rate: Option<Decimal>,
    #[validate(custom = "validate_rate")]
    pub monthly_rate: Option<Decimal>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(custom = "validate_vin")]
    pub vin: Option<String>,
    pub features: Option<Vec<String>>,
    /// Sólo se usa en el alta; por defecto disponible
    pub is_available: Option<bool>,
}

impl VehicleRequest {
    pub fn into_spec(self) -> VehicleSpec {
        let features = self.features.map(|features| {
            features
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect::<Vec<_>>()
        });

        VehicleSpec {
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            vehicle_type: self.vehicle_type,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
            seats: self.seats,
            daily_rate: self.daily_rate,
            weekly_rate: self.weekly_rate,
            monthly_rate: self.monthly_rate,
            image_url: non_empty(self.image_url),
            license_plate: non_empty(self.license_plate),
            vin: non_empty(self.vin).map(|vin| vin.to_ascii_uppercase()),
            features: features.filter(|f| !f.is_empty()),
        }
    }
}

// Override manual de disponibilidad
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

// Vista pública del catálogo (sin VIN ni matrícula)
#[derive(Debug, Serialize)]
pub struct CatalogVehicleResponse {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub display_name: String,
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
    pub features: Vec<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for CatalogVehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            display_name: vehicle.display_name(),
            id: vehicle.id,
            agency_id: vehicle.agency_id,
            make: vehicle.make,
            model: vehicle.model,
            year: vehicle.year,
            vehicle_type: vehicle.vehicle_type,
            transmission: vehicle.transmission,
            fuel_type: vehicle.fuel_type,
            seats: vehicle.seats,
            daily_rate: vehicle.daily_rate,
            weekly_rate: vehicle.weekly_rate,
            monthly_rate: vehicle.monthly_rate,
            image_url: vehicle.image_url,
            features: vehicle.features.unwrap_or_default(),
            is_available: vehicle.is_available,
            created_at: vehicle.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(extra: serde_json::Value) -> VehicleRequest {
        let mut body = json!({
            "make": " Toyota ",
            "model": "Camry",
            "year": 2023,
            "vehicle_type": "midsize",
            "transmission": "automatic",
            "fuel_type": "hybrid",
            "seats": 5,
            "daily_rate": "45.00"
        });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_request_into_spec() {
        let req = request(json!({ "vin": "1hgbh41jxmn109186", "features": ["GPS", " "] }));
        assert!(req.validate().is_ok());

        let spec = req.into_spec();
        assert_eq!(spec.make, "Toyota");
        assert_eq!(spec.vin.as_deref(), Some("1HGBH41JXMN109186"));
        assert_eq!(spec.features, Some(vec!["GPS".to_string()]));
    }

    #[test]
    fn test_non_positive_rate_is_rejected() {
        let req = request(json!({ "daily_rate": "0" }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_vin_is_rejected() {
        let req = request(json!({ "vin": "NOT-A-VIN" }));
        assert!(req.validate().is_err());
    }
}
