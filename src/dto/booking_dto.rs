use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::vehicle::Vehicle;
use crate::services::booking_workflow::{AgencyBooking, BookingRequest};
use crate::utils::validation::{non_empty, validate_not_blank, validate_phone};

// Request de reserva del formulario público
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(custom = "validate_not_blank", length(max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(request: CreateBookingRequest) -> Self {
        Self {
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            phone_number: non_empty(request.phone_number),
            notes: non_empty(request.notes),
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

// Filtro del listado de reservas
#[derive(Debug, Deserialize, Default)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
}

// Vehículo resumido dentro de una reserva
#[derive(Debug, Serialize)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub display_name: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: Option<String>,
    pub daily_rate: Decimal,
    pub is_available: bool,
}

impl From<Vehicle> for VehicleSummary {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            display_name: vehicle.display_name(),
            id: vehicle.id,
            make: vehicle.make,
            model: vehicle.model,
            year: vehicle.year,
            license_plate: vehicle.license_plate,
            daily_rate: vehicle.daily_rate,
            is_available: vehicle.is_available,
        }
    }
}

// Reserva tal como la ve la agencia
#[derive(Debug, Serialize)]
pub struct AgencyBookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub vehicle: VehicleSummary,
}

impl From<AgencyBooking> for AgencyBookingResponse {
    fn from(row: AgencyBooking) -> Self {
        Self {
            booking: row.booking,
            vehicle: row.vehicle.into(),
        }
    }
}
