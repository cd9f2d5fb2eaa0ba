//! DTOs de la API HTTP
//!
//! Requests con `validator` y responses serializables. Los handlers llaman
//! a `validate()` antes de pasar nada a los controllers.

pub mod agency_dto;
pub mod api_response;
pub mod auth_dto;
pub mod booking_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
