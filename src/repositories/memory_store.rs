//! Store en memoria
//!
//! Implementa los mismos contratos que `PgStore` sobre tablas `HashMap`
//! protegidas por un único mutex. Emula las restricciones del schema:
//! email único, una agencia por usuario, claves foráneas y el
//! `ON DELETE RESTRICT` de bookings → vehicles. Se usa en desarrollo
//! (`STORE_BACKEND=memory`) y en los tests de integración.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AgencyRepository, BookingRepository, UserRepository, VehicleRepository};
use crate::models::{
    Agency, AgencyChanges, Booking, BookingStatus, BookingTransition, NewAgency, NewBooking,
    NewUser, NewVehicle, TransitionOutcome, User, Vehicle, VehicleSpec,
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    agencies: HashMap<Uuid, Agency>,
    vehicles: HashMap<Uuid, Vehicle>,
    bookings: HashMap<Uuid, Booking>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }

        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            user_type: user.user_type,
            created_at: user.created_at,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl AgencyRepository for MemoryStore {
    async fn insert_agency(&self, agency: NewAgency) -> AppResult<Agency> {
        let mut tables = self.tables.lock().await;

        if !tables.users.contains_key(&agency.user_id) {
            return Err(AppError::Conflict(
                "insert or update on table \"agencies\" violates foreign key constraint".to_string(),
            ));
        }
        if tables.agencies.values().any(|a| a.user_id == agency.user_id) {
            return Err(AppError::Conflict(
                "duplicate key value violates unique constraint \"agencies_user_id_key\""
                    .to_string(),
            ));
        }

        let row = Agency {
            id: Uuid::new_v4(),
            user_id: agency.user_id,
            company_name: agency.company_name,
            contact_email: agency.contact_email,
            contact_phone: agency.contact_phone,
            address: agency.address,
            city: agency.city,
            state: agency.state,
            postal_code: agency.postal_code,
            website: agency.website,
            description: agency.description,
            created_at: agency.created_at,
            updated_at: agency.created_at,
        };
        tables.agencies.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_agency_by_user(&self, user_id: Uuid) -> AppResult<Option<Agency>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .agencies
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn update_agency(
        &self,
        id: Uuid,
        changes: AgencyChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Agency>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.agencies.get_mut(&id).map(|agency| {
            changes.apply_to(agency, now);
            agency.clone()
        }))
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let mut tables = self.tables.lock().await;

        if !tables.agencies.contains_key(&vehicle.agency_id) {
            return Err(AppError::Conflict(
                "insert or update on table \"vehicles\" violates foreign key constraint".to_string(),
            ));
        }

        let row = vehicle.into_vehicle(Uuid::new_v4());
        tables.vehicles.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles_by_agency(&self, agency_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.lock().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| v.agency_id == agency_id)
            .cloned()
            .collect();
        newest_first(&mut vehicles, |v| v.created_at);
        Ok(vehicles)
    }

    async fn list_available_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.lock().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| v.is_available)
            .cloned()
            .collect();
        newest_first(&mut vehicles, |v| v.created_at);
        Ok(vehicles)
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        spec: VehicleSpec,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.vehicles.get_mut(&id).map(|vehicle| {
            spec.apply_to(vehicle, now);
            vehicle.clone()
        }))
    }

    async fn set_vehicle_availability(
        &self,
        id: Uuid,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Vehicle>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.vehicles.get_mut(&id).map(|vehicle| {
            vehicle.is_available = is_available;
            vehicle.updated_at = now;
            vehicle.clone()
        }))
    }

    async fn delete_vehicle(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;

        if tables.bookings.values().any(|b| b.vehicle_id == id) {
            return Err(AppError::Conflict(
                "update or delete on table \"vehicles\" violates foreign key constraint \"bookings_vehicle_id_fkey\" on table \"bookings\""
                    .to_string(),
            ));
        }

        Ok(tables.vehicles.remove(&id).is_some())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tables = self.tables.lock().await;

        if !tables.vehicles.contains_key(&booking.vehicle_id) {
            return Err(AppError::Conflict(
                "insert or update on table \"bookings\" violates foreign key constraint".to_string(),
            ));
        }
        if booking.end_date < booking.start_date {
            return Err(AppError::BadRequest(
                "new row for relation \"bookings\" violates check constraint".to_string(),
            ));
        }

        let row = booking.into_booking(Uuid::new_v4());
        tables.bookings.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn latest_booking_for(
        &self,
        vehicle_id: Uuid,
        ip_address: &str,
    ) -> AppResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.vehicle_id == vehicle_id && b.ip_address.as_deref() == Some(ip_address))
            .max_by_key(|b| b.created_at)
            .cloned())
    }

    async fn list_bookings_for_vehicles(
        &self,
        vehicle_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| vehicle_ids.contains(&b.vehicle_id))
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn transition_booking(
        &self,
        id: Uuid,
        transition: BookingTransition,
        now: DateTime<Utc>,
    ) -> AppResult<TransitionOutcome> {
        // El mutex hace de transacción: lectura, comprobación y escritura juntas
        let mut tables = self.tables.lock().await;

        let Some(current) = tables.bookings.get(&id).cloned() else {
            return Ok(TransitionOutcome::NotFound);
        };

        if current.status != transition.from() {
            return Ok(TransitionOutcome::StatusMismatch {
                current: current.status,
            });
        }

        if transition == BookingTransition::Accept
            && tables.bookings.values().any(|b| {
                b.vehicle_id == current.vehicle_id
                    && b.id != id
                    && b.status == BookingStatus::Accepted
            })
        {
            return Ok(TransitionOutcome::VehicleAlreadyRented {
                vehicle_id: current.vehicle_id,
            });
        }

        let next = transition.to();
        if let Some(is_available) = next.vehicle_availability() {
            if let Some(vehicle) = tables.vehicles.get_mut(&current.vehicle_id) {
                vehicle.is_available = is_available;
                vehicle.updated_at = now;
            }
        }

        let booking = match tables.bookings.get_mut(&id) {
            Some(booking) => {
                booking.status = next;
                booking.updated_at = now;
                booking.clone()
            }
            None => return Ok(TransitionOutcome::NotFound),
        };

        Ok(TransitionOutcome::Applied { booking })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, Transmission, UserType, VehicleType};
    use chrono::{Duration, NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn spec() -> VehicleSpec {
        VehicleSpec {
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2023,
            vehicle_type: VehicleType::Midsize,
            transmission: Transmission::Automatic,
            fuel_type: FuelType::Hybrid,
            seats: 5,
            daily_rate: Decimal::new(4500, 2),
            weekly_rate: None,
            monthly_rate: None,
            image_url: None,
            license_plate: None,
            vin: None,
            features: None,
        }
    }

    async fn seed(store: &MemoryStore) -> (Agency, Vehicle) {
        let user = store
            .insert_user(NewUser {
                email: "ops@fleet.test".to_string(),
                password_hash: "hash".to_string(),
                user_type: UserType::Agency,
                created_at: t0(),
            })
            .await
            .unwrap();
        let agency = store
            .insert_agency(NewAgency {
                user_id: user.id,
                company_name: "Fleet".to_string(),
                contact_email: "ops@fleet.test".to_string(),
                contact_phone: None,
                address: None,
                city: None,
                state: None,
                postal_code: None,
                website: None,
                description: None,
                created_at: t0(),
            })
            .await
            .unwrap();
        let vehicle = store
            .insert_vehicle(NewVehicle {
                agency_id: agency.id,
                spec: spec(),
                is_available: true,
                created_at: t0(),
            })
            .await
            .unwrap();
        (agency, vehicle)
    }

    fn booking_for(vehicle_id: Uuid, ip: &str, created_at: DateTime<Utc>) -> NewBooking {
        NewBooking {
            vehicle_id,
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            phone_number: None,
            notes: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            ip_address: Some(ip.to_string()),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_concurrent_accepts_rent_the_vehicle_once() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let (_, vehicle) = seed(&store).await;
        let first = store
            .insert_booking(booking_for(vehicle.id, "203.0.113.1", t0()))
            .await
            .unwrap();
        let second = store
            .insert_booking(booking_for(vehicle.id, "203.0.113.2", t0()))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            tokio::spawn({
                let store = store.clone();
                async move { store.transition_booking(first.id, BookingTransition::Accept, t0()).await }
            }),
            tokio::spawn({
                let store = store.clone();
                async move { store.transition_booking(second.id, BookingTransition::Accept, t0()).await }
            }),
        );
        let outcomes = [a.unwrap().unwrap(), b.unwrap().unwrap()];

        let applied = outcomes
            .iter()
            .filter(|o| matches!(o, TransitionOutcome::Applied { .. }))
            .count();
        assert_eq!(applied, 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, TransitionOutcome::VehicleAlreadyRented { .. })));
        assert!(!store.find_vehicle(vehicle.id).await.unwrap().unwrap().is_available);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        seed(&store).await;

        let result = store
            .insert_user(NewUser {
                email: "ops@fleet.test".to_string(),
                password_hash: "other".to_string(),
                user_type: UserType::Renter,
                created_at: t0(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_second_agency_for_same_user_is_conflict() {
        let store = MemoryStore::new();
        let (agency, _) = seed(&store).await;

        let result = store
            .insert_agency(NewAgency {
                user_id: agency.user_id,
                company_name: "Again".to_string(),
                contact_email: "again@fleet.test".to_string(),
                contact_phone: None,
                address: None,
                city: None,
                state: None,
                postal_code: None,
                website: None,
                description: None,
                created_at: t0(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_latest_booking_matches_exact_ip() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;

        store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();
        let newer = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0() + Duration::days(2)))
            .await
            .unwrap();

        let latest = store.latest_booking_for(vehicle.id, "10.0.0.1").await.unwrap();
        assert_eq!(latest.map(|b| b.id), Some(newer.id));

        let other = store.latest_booking_for(vehicle.id, "10.0.0.2").await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_transition_flips_availability() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;
        let booking = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();

        let outcome = store
            .transition_booking(booking.id, BookingTransition::Accept, t0())
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::Applied { .. }));
        let rented = store.find_vehicle(vehicle.id).await.unwrap().unwrap();
        assert!(!rented.is_available);

        store
            .transition_booking(booking.id, BookingTransition::Complete, t0())
            .await
            .unwrap();
        let returned = store.find_vehicle(vehicle.id).await.unwrap().unwrap();
        assert!(returned.is_available);
    }

    #[tokio::test]
    async fn test_transition_from_wrong_status_is_mismatch() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;
        let booking = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();

        let outcome = store
            .transition_booking(booking.id, BookingTransition::Complete, t0())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            TransitionOutcome::StatusMismatch {
                current: BookingStatus::Pending
            }
        ));
        let vehicle = store.find_vehicle(vehicle.id).await.unwrap().unwrap();
        assert!(vehicle.is_available);
    }

    #[tokio::test]
    async fn test_second_accept_on_same_vehicle_is_refused() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;
        let first = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();
        let second = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.2", t0()))
            .await
            .unwrap();

        store
            .transition_booking(first.id, BookingTransition::Accept, t0())
            .await
            .unwrap();
        let outcome = store
            .transition_booking(second.id, BookingTransition::Accept, t0())
            .await
            .unwrap();

        assert!(matches!(outcome, TransitionOutcome::VehicleAlreadyRented { .. }));
        let second = store.find_booking(second.id).await.unwrap().unwrap();
        assert_eq!(second.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_delete_vehicle_with_bookings_is_restricted() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;
        store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();

        let result = store.delete_vehicle(vehicle.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(store.find_vehicle(vehicle.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_bookings_filters_by_vehicle_set_and_status() {
        let store = MemoryStore::new();
        let (_, vehicle) = seed(&store).await;
        let booking = store
            .insert_booking(booking_for(vehicle.id, "10.0.0.1", t0()))
            .await
            .unwrap();

        let all = store
            .list_bookings_for_vehicles(&[vehicle.id], None)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let accepted = store
            .list_bookings_for_vehicles(&[vehicle.id], Some(BookingStatus::Accepted))
            .await
            .unwrap();
        assert!(accepted.is_empty());

        let elsewhere = store
            .list_bookings_for_vehicles(&[Uuid::new_v4()], None)
            .await
            .unwrap();
        assert!(elsewhere.is_empty());
        assert_eq!(all[0].id, booking.id);
    }
}
