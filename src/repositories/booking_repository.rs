use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::models::booking::{
    Booking, BookingStatus, BookingTransition, NewBooking, TransitionOutcome,
};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserta la reserva en estado `pending`
    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Última reserva para el par exacto (vehículo, IP) por `created_at`
    async fn latest_booking_for(
        &self,
        vehicle_id: Uuid,
        ip_address: &str,
    ) -> AppResult<Option<Booking>>;

    /// Reservas cuyo vehículo pertenece al conjunto dado, más recientes primero
    async fn list_bookings_for_vehicles(
        &self,
        vehicle_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;

    /// Update condicional `status = transition.from()` más el cambio de
    /// disponibilidad del vehículo, todo en una transacción
    async fn transition_booking(
        &self,
        id: Uuid,
        transition: BookingTransition,
        now: DateTime<Utc>,
    ) -> AppResult<TransitionOutcome>;
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let result = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, vehicle_id, customer_name, customer_email, phone_number, notes,
                start_date, end_date, status, ip_address, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.vehicle_id)
        .bind(booking.customer_name)
        .bind(booking.customer_email)
        .bind(booking.phone_number)
        .bind(booking.notes)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.ip_address)
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_booking(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn latest_booking_for(
        &self,
        vehicle_id: Uuid,
        ip_address: &str,
    ) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1 AND ip_address = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(vehicle_id)
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn list_bookings_for_vehicles(
        &self,
        vehicle_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = ANY($1)
              AND ($2::booking_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(vehicle_ids)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn transition_booking(
        &self,
        id: Uuid,
        transition: BookingTransition,
        now: DateTime<Utc>,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(TransitionOutcome::NotFound);
        };

        if current.status != transition.from() {
            return Ok(TransitionOutcome::StatusMismatch {
                current: current.status,
            });
        }

        if transition == BookingTransition::Accept {
            // El lock de la fila del vehículo serializa aceptaciones concurrentes
            sqlx::query("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(current.vehicle_id)
                .execute(&mut *tx)
                .await?;

            let (rented,): (bool,) = sqlx::query_as(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM bookings
                    WHERE vehicle_id = $1 AND status = 'accepted' AND id <> $2
                )
                "#,
            )
            .bind(current.vehicle_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if rented {
                return Ok(TransitionOutcome::VehicleAlreadyRented {
                    vehicle_id: current.vehicle_id,
                });
            }
        }

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transition.to())
        .bind(now)
        .bind(transition.from())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Ok(TransitionOutcome::StatusMismatch {
                current: current.status,
            });
        };

        if let Some(is_available) = transition.to().vehicle_availability() {
            sqlx::query("UPDATE vehicles SET is_available = $2, updated_at = $3 WHERE id = $1")
                .bind(updated.vehicle_id)
                .bind(is_available)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(TransitionOutcome::Applied { booking: updated })
    }
}
