use std::net::IpAddr;

use uuid::Uuid;

use crate::dto::booking_dto::{AgencyBookingResponse, CreateBookingRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{Booking, BookingStatus, BookingTransition};
use crate::services::booking_workflow::BookingWorkflow;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct BookingController {
    workflow: BookingWorkflow,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            workflow: state.bookings.clone(),
        }
    }

    pub async fn create(
        &self,
        vehicle_id: Uuid,
        request: CreateBookingRequest,
        requester_ip: Option<IpAddr>,
    ) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self
            .workflow
            .create_booking(vehicle_id, request.into(), requester_ip)
            .await?;

        Ok(ApiResponse::success_with_message(
            booking,
            "Booking request sent. The agency will contact you shortly",
        ))
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        status: Option<BookingStatus>,
    ) -> Result<Vec<AgencyBookingResponse>, AppError> {
        let rows = self.workflow.agency_bookings(user, status).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn current_rentals(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<AgencyBookingResponse>, AppError> {
        let rows = self.workflow.current_rentals(user).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn transition(
        &self,
        user: &AuthenticatedUser,
        booking_id: Uuid,
        transition: BookingTransition,
    ) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self
            .workflow
            .apply_transition(user, booking_id, transition)
            .await?;

        let message = match transition {
            BookingTransition::Accept => "Booking accepted",
            BookingTransition::Decline => "Booking declined",
            BookingTransition::Complete => "Vehicle marked as returned",
        };
        Ok(ApiResponse::success_with_message(booking, message))
    }
}
