//! Services module
//!
//! Lógica de negocio del marketplace: workflow de reservas, rate limiter,
//! fan-out de notificaciones, sesiones, reloj y métricas.

pub mod booking_workflow;
pub mod clock;
pub mod metrics;
pub mod notification_hub;
pub mod rate_limiter;
pub mod session_service;

pub use booking_workflow::{AgencyBooking, BookingRequest, BookingWorkflow};
pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::BookingMetrics;
pub use notification_hub::{DashboardEvent, DashboardSubscription, NotificationHub};
pub use rate_limiter::{Admission, BookingRateLimiter};
pub use session_service::{AuthService, Session, SessionRegistry};
