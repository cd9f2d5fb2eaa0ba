//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de `migrations/`.

pub mod agency;
pub mod booking;
pub mod user;
pub mod vehicle;

pub use agency::{agency_topic, Agency, AgencyChanges, NewAgency};
pub use booking::{Booking, BookingStatus, BookingTransition, NewBooking, TransitionOutcome};
pub use user::{NewUser, User, UserType};
pub use vehicle::{FuelType, NewVehicle, Transmission, Vehicle, VehicleSpec, VehicleType};
