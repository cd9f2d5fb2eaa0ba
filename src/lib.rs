//! Rental Hub
//!
//! Backend del marketplace de alquiler de vehículos: catálogo público,
//! solicitudes de reserva con cooldown por (vehículo, IP), gestión de
//! reservas por la agencia y notificaciones en vivo para su dashboard.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
