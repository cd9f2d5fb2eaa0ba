//! Repositorios
//!
//! Un trait por tabla y dos implementaciones: `PgStore` (PostgreSQL vía sqlx)
//! y `MemoryStore`. El resto de la aplicación sólo ve `dyn RecordStore`.

pub mod agency_repository;
pub mod booking_repository;
pub mod memory_store;
pub mod user_repository;
pub mod vehicle_repository;

use sqlx::PgPool;

pub use agency_repository::AgencyRepository;
pub use booking_repository::BookingRepository;
pub use memory_store::MemoryStore;
pub use user_repository::UserRepository;
pub use vehicle_repository::VehicleRepository;

/// Store respaldado por PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Todos los repositorios juntos
pub trait RecordStore:
    UserRepository + AgencyRepository + VehicleRepository + BookingRepository
{
}

impl<T> RecordStore for T where
    T: UserRepository + AgencyRepository + VehicleRepository + BookingRepository
{
}
