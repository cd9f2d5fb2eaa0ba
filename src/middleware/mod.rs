//! Middleware del sistema
//!
//! Extractores de autenticación e IP del cliente, y la capa de CORS.

pub mod auth;
pub mod client_ip;
pub mod cors;

pub use auth::AuthenticatedUser;
pub use client_ip::ClientIp;
pub use cors::cors_layer;
