//! Workflow de admisión de reservas
//!
//! Orquesta validación, rate limit, persistencia, notificación y las
//! transiciones de estado con su efecto sobre la disponibilidad:
//!
//! ```text
//! POST /api/book/:vehicle_id
//!   ├─ fechas (today <= start <= end)
//!   ├─ vehículo existe y is_available
//!   ├─ cooldown (vehículo, IP)
//!   ├─ INSERT pending
//!   └─ feed de cambios + "new-booking" en agency-{id}
//! ```
//!
//! Las transiciones se aplican en el store con un update condicional; el
//! operador sólo puede tocar reservas de vehículos de su propia agencia.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    Agency, Booking, BookingStatus, BookingTransition, NewBooking, TransitionOutcome, Vehicle,
};
use crate::repositories::{AgencyRepository, BookingRepository, RecordStore, VehicleRepository};
use crate::services::clock::Clock;
use crate::services::metrics::BookingMetrics;
use crate::services::notification_hub::{
    ChangeKind, DashboardSubscription, NotificationHub, NEW_BOOKING_EVENT,
};
use crate::services::rate_limiter::{Admission, BookingRateLimiter};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::validate_booking_dates;

/// Datos de la solicitud ya validados sintácticamente
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Reserva de la agencia junto al vehículo reservado
#[derive(Debug, Clone)]
pub struct AgencyBooking {
    pub booking: Booking,
    pub vehicle: Vehicle,
}

#[derive(Clone)]
pub struct BookingWorkflow {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    limiter: BookingRateLimiter,
    hub: NotificationHub,
    metrics: BookingMetrics,
}

impl BookingWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        limiter: BookingRateLimiter,
        hub: NotificationHub,
        metrics: BookingMetrics,
    ) -> Self {
        Self {
            store,
            clock,
            limiter,
            hub,
            metrics,
        }
    }

    /// Crear una reserva `pending` para un vehículo del catálogo
    pub async fn create_booking(
        &self,
        vehicle_id: Uuid,
        request: BookingRequest,
        requester_ip: Option<IpAddr>,
    ) -> AppResult<Booking> {
        let now = self.clock.now();
        validate_booking_dates(request.start_date, request.end_date, self.clock.today())?;

        let vehicle = self
            .store
            .find_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if !vehicle.is_available {
            return Err(AppError::Conflict(
                "This vehicle is not available for booking".to_string(),
            ));
        }

        if let Admission::Deny { retry_after } = self
            .limiter
            .check_and_admit(&*self.store, vehicle_id, requester_ip, now)
            .await?
        {
            self.metrics.record_rate_limit_denial();
            warn!(
                vehicle_id = %vehicle_id,
                ip = ?requester_ip,
                retry_after_secs = retry_after.num_seconds(),
                "🚫 Booking refused by cooldown"
            );
            return Err(AppError::RateLimited {
                retry_after_secs: whole_seconds_up(retry_after),
            });
        }

        let booking = self
            .store
            .insert_booking(NewBooking {
                vehicle_id,
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                phone_number: request.phone_number,
                notes: request.notes,
                start_date: request.start_date,
                end_date: request.end_date,
                ip_address: requester_ip.map(|ip| ip.to_string()),
                created_at: now,
            })
            .await?;

        self.metrics.record_booking_created();
        info!(
            booking_id = %booking.id,
            vehicle_id = %vehicle_id,
            agency_id = %vehicle.agency_id,
            "📝 Booking request created"
        );

        self.hub.publish_change(ChangeKind::Insert, &booking);
        self.metrics.record_notification("change_feed");

        // La reserva ya está guardada: sin receptores sólo queda el log
        let delivered = self.hub.broadcast(vehicle.agency_id, NEW_BOOKING_EVENT).await;
        self.metrics.record_notification("broadcast");
        if delivered == 0 {
            info!(agency_id = %vehicle.agency_id, "No open dashboard for new-booking broadcast");
        }

        Ok(booking)
    }

    /// Aceptar, rechazar o completar una reserva de la propia agencia
    pub async fn apply_transition(
        &self,
        user: &AuthenticatedUser,
        booking_id: Uuid,
        transition: BookingTransition,
    ) -> AppResult<Booking> {
        let agency = self.agency_for(user).await?;

        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let vehicle = self
            .store
            .find_vehicle(booking.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.agency_id != agency.id {
            warn!(
                booking_id = %booking_id,
                agency_id = %agency.id,
                "Transition attempted on another agency's booking"
            );
            return Err(AppError::Forbidden(
                "This booking belongs to another agency".to_string(),
            ));
        }

        let outcome = self
            .store
            .transition_booking(booking_id, transition, self.clock.now())
            .await?;

        match outcome {
            TransitionOutcome::Applied { booking } => {
                self.metrics.record_transition(transition.as_str());
                info!(
                    booking_id = %booking.id,
                    vehicle_id = %booking.vehicle_id,
                    from = %transition.from(),
                    to = %booking.status,
                    "✅ Booking transition applied"
                );
                if let Some(is_available) = booking.status.vehicle_availability() {
                    info!(vehicle_id = %booking.vehicle_id, is_available, "🚗 Vehicle availability updated");
                }

                self.hub.publish_change(ChangeKind::Update, &booking);
                self.metrics.record_notification("change_feed");
                Ok(booking)
            }
            TransitionOutcome::NotFound => {
                Err(AppError::NotFound("Booking not found".to_string()))
            }
            TransitionOutcome::StatusMismatch { current } => Err(AppError::Conflict(format!(
                "Cannot {} a booking that is {}",
                transition.as_str(),
                current
            ))),
            TransitionOutcome::VehicleAlreadyRented { vehicle_id } => {
                warn!(vehicle_id = %vehicle_id, "Accept refused: vehicle already rented");
                Err(AppError::Conflict(
                    "This vehicle already has an accepted booking".to_string(),
                ))
            }
        }
    }

    /// Reservas de la flota de la agencia, más recientes primero
    pub async fn agency_bookings(
        &self,
        user: &AuthenticatedUser,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<AgencyBooking>> {
        let agency = self.agency_for(user).await?;
        let fleet: HashMap<Uuid, Vehicle> = self
            .store
            .list_vehicles_by_agency(agency.id)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let vehicle_ids: Vec<Uuid> = fleet.keys().copied().collect();
        let bookings = self
            .store
            .list_bookings_for_vehicles(&vehicle_ids, status)
            .await?;

        Ok(bookings
            .into_iter()
            .filter_map(|booking| {
                fleet.get(&booking.vehicle_id).cloned().map(|vehicle| AgencyBooking {
                    booking,
                    vehicle,
                })
            })
            .collect())
    }

    /// Alquileres en curso (= reservas aceptadas)
    pub async fn current_rentals(&self, user: &AuthenticatedUser) -> AppResult<Vec<AgencyBooking>> {
        self.agency_bookings(user, Some(BookingStatus::Accepted)).await
    }

    /// Abrir la suscripción en vivo del dashboard de la agencia
    pub async fn open_dashboard(&self, user: &AuthenticatedUser) -> AppResult<DashboardSubscription> {
        let agency = self.agency_for(user).await?;
        let vehicle_ids = self.fleet_ids(agency.id).await?;
        Ok(self.hub.subscribe(agency.id, vehicle_ids).await)
    }

    pub async fn fleet_ids(&self, agency_id: Uuid) -> AppResult<HashSet<Uuid>> {
        Ok(self
            .store
            .list_vehicles_by_agency(agency_id)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect())
    }

    async fn agency_for(&self, user: &AuthenticatedUser) -> AppResult<Agency> {
        self.store.require_agency_of(user.user_id).await
    }
}

fn whole_seconds_up(duration: Duration) -> i64 {
    let secs = duration.num_seconds();
    if duration > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}
