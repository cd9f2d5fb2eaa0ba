//! Rate limiter de reservas
//!
//! Una misma IP sólo puede solicitar un vehículo concreto una vez cada
//! `cooldown` (24h por defecto). El estado vive en la tabla `bookings`:
//! se consulta la última reserva del par exacto (vehículo, IP), así que el
//! límite sobrevive a reinicios y es compartido entre instancias.
//!
//! La comprobación y el insert posterior no son atómicos; dos peticiones
//! simultáneas del mismo par pueden pasar ambas.

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repositories::BookingRepository;
use crate::utils::errors::AppResult;

/// Resultado de la comprobación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BookingRateLimiter {
    cooldown: Duration,
}

impl BookingRateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn from_secs(cooldown_secs: i64) -> Self {
        Self::new(Duration::seconds(cooldown_secs))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decisión pura a partir de la última reserva del par.
    /// Con delta exactamente igual al cooldown se admite.
    pub fn evaluate(&self, last_created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Admission {
        let Some(last) = last_created_at else {
            return Admission::Allow;
        };

        // Una fila "en el futuro" (desfase de reloj) cuenta como recién creada
        let delta = (now - last).max(Duration::zero());

        if delta < self.cooldown {
            Admission::Deny {
                retry_after: self.cooldown - delta,
            }
        } else {
            Admission::Allow
        }
    }

    /// Consultar el store y decidir. Sin IP no hay clave: se admite y se avisa.
    pub async fn check_and_admit<S>(
        &self,
        store: &S,
        vehicle_id: Uuid,
        requester_ip: Option<IpAddr>,
        now: DateTime<Utc>,
    ) -> AppResult<Admission>
    where
        S: BookingRepository + ?Sized,
    {
        let Some(ip) = requester_ip else {
            warn!(
                vehicle_id = %vehicle_id,
                "⚠️ Client IP unavailable, booking cooldown skipped for this request"
            );
            return Ok(Admission::Allow);
        };

        let last = store.latest_booking_for(vehicle_id, &ip.to_string()).await?;
        let admission = self.evaluate(last.map(|b| b.created_at), now);

        debug!(vehicle_id = %vehicle_id, ip = %ip, ?admission, "Booking cooldown evaluated");
        Ok(admission)
    }
}

impl Default for BookingRateLimiter {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAgency, NewBooking, NewUser, NewVehicle, UserType, VehicleSpec};
    use crate::models::{FuelType, Transmission, VehicleType};
    use crate::repositories::{AgencyRepository, MemoryStore, UserRepository, VehicleRepository};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_no_previous_booking_allows() {
        let limiter = BookingRateLimiter::default();
        assert_eq!(limiter.evaluate(None, t0()), Admission::Allow);
    }

    #[test]
    fn test_exact_cooldown_boundary_allows() {
        let limiter = BookingRateLimiter::default();
        let now = t0() + Duration::hours(24);
        assert_eq!(limiter.evaluate(Some(t0()), now), Admission::Allow);
    }

    #[test]
    fn test_one_second_before_boundary_denies() {
        let limiter = BookingRateLimiter::default();
        let now = t0() + Duration::hours(24) - Duration::seconds(1);
        assert_eq!(
            limiter.evaluate(Some(t0()), now),
            Admission::Deny {
                retry_after: Duration::seconds(1)
            }
        );
    }

    #[test]
    fn test_future_row_is_treated_as_fresh() {
        let limiter = BookingRateLimiter::default();
        let admission = limiter.evaluate(Some(t0() + Duration::minutes(5)), t0());
        assert_eq!(
            admission,
            Admission::Deny {
                retry_after: Duration::hours(24)
            }
        );
    }

    async fn store_with_vehicle() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                email: "desk@rentals.test".to_string(),
                password_hash: "x".to_string(),
                user_type: UserType::Agency,
                created_at: t0(),
            })
            .await
            .unwrap();
        let agency = store
            .insert_agency(NewAgency {
                user_id: user.id,
                company_name: "Rentals".to_string(),
                contact_email: "desk@rentals.test".to_string(),
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
                spec: VehicleSpec {
                    make: "Ford".to_string(),
                    model: "Transit".to_string(),
                    year: 2022,
                    vehicle_type: VehicleType::Van,
                    transmission: Transmission::Manual,
                    fuel_type: FuelType::Diesel,
                    seats: 3,
                    daily_rate: Decimal::new(8000, 2),
                    weekly_rate: None,
                    monthly_rate: None,
                    image_url: None,
                    license_plate: None,
                    vin: None,
                    features: None,
                },
                is_available: true,
                created_at: t0(),
            })
            .await
            .unwrap();
        (store, vehicle.id)
    }

    #[tokio::test]
    async fn test_cooldown_scenario_against_store() {
        let (store, vehicle_id) = store_with_vehicle().await;
        let limiter = BookingRateLimiter::default();
        let ip: IpAddr = "1.2.3.4".parse().unwrap();

        let first = limiter
            .check_and_admit(&store, vehicle_id, Some(ip), t0())
            .await
            .unwrap();
        assert!(first.is_allowed());

        store
            .insert_booking(NewBooking {
                vehicle_id,
                customer_name: "Ana".to_string(),
                customer_email: "ana@example.com".to_string(),
                phone_number: None,
                notes: None,
                start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
                ip_address: Some(ip.to_string()),
                created_at: t0(),
            })
            .await
            .unwrap();

        let after_one_hour = limiter
            .check_and_admit(&store, vehicle_id, Some(ip), t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(
            after_one_hour,
            Admission::Deny {
                retry_after: Duration::hours(23)
            }
        );

        let after_a_day = limiter
            .check_and_admit(&store, vehicle_id, Some(ip), t0() + Duration::hours(25))
            .await
            .unwrap();
        assert!(after_a_day.is_allowed());

        let other_ip = limiter
            .check_and_admit(&store, vehicle_id, Some("5.6.7.8".parse().unwrap()), t0())
            .await
            .unwrap();
        assert!(other_ip.is_allowed());
    }

    #[tokio::test]
    async fn test_missing_ip_fails_open() {
        let (store, vehicle_id) = store_with_vehicle().await;
        let limiter = BookingRateLimiter::default();

        let admission = limiter
            .check_and_admit(&store, vehicle_id, None, t0())
            .await
            .unwrap();
        assert!(admission.is_allowed());
    }
}
