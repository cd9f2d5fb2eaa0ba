//! Controllers
//!
//! Un controller por recurso, construido por request a partir de `AppState`.

pub mod agency_controller;
pub mod auth_controller;
pub mod booking_controller;
pub mod vehicle_controller;
