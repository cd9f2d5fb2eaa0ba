//! Modelo de Booking
//!
//! Una solicitud de alquiler de un vehículo en un rango de fechas.
//! Las reservas nunca se borran; el estado sólo avanza:
//!
//! ```text
//! pending ──accept──▶ accepted ──complete──▶ completed
//!    └────decline───▶ declined
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Declined => "declined",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Declined | BookingStatus::Completed)
    }

    /// Transiciones permitidas; ninguna vuelve a `pending`
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Declined)
                | (BookingStatus::Accepted, BookingStatus::Completed)
        )
    }

    /// Valor de `is_available` que el vehículo debe tener al entrar en este estado
    pub fn vehicle_availability(self) -> Option<bool> {
        match self {
            BookingStatus::Accepted => Some(false),
            BookingStatus::Completed => Some(true),
            BookingStatus::Pending | BookingStatus::Declined => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acciones del operador sobre una reserva existente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingTransition {
    Accept,
    Decline,
    Complete,
}

impl BookingTransition {
    /// Estado esperado antes de la transición (precondición del update condicional)
    pub fn from(self) -> BookingStatus {
        match self {
            BookingTransition::Accept | BookingTransition::Decline => BookingStatus::Pending,
            BookingTransition::Complete => BookingStatus::Accepted,
        }
    }

    pub fn to(self) -> BookingStatus {
        match self {
            BookingTransition::Accept => BookingStatus::Accepted,
            BookingTransition::Decline => BookingStatus::Declined,
            BookingTransition::Complete => BookingStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingTransition::Accept => "accept",
            BookingTransition::Decline => "decline",
            BookingTransition::Complete => "complete",
        }
    }
}

/// Resultado de aplicar una transición en el store
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Estado y disponibilidad actualizados en la misma transacción
    Applied { booking: Booking },
    NotFound,
    /// El estado actual no es el esperado (otra sesión lo cambió antes)
    StatusMismatch { current: BookingStatus },
    /// Otra reserva del mismo vehículo ya está aceptada
    VehicleAlreadyRented { vehicle_id: Uuid },
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    /// Clave del rate limiter; no se expone en la API
    #[serde(skip_serializing, default)]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila a insertar en bookings; siempre entra como `pending`
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            vehicle_id: self.vehicle_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            phone_number: self.phone_number,
            notes: self.notes,
            start_date: self.start_date,
            end_date: self.end_date,
            status: BookingStatus::Pending,
            ip_address: self.ip_address,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
