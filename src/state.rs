//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Nada es global: store, reloj, sesiones y
//! hub de notificaciones entran aquí explícitamente.

use std::sync::Arc;

use anyhow::Result;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::RecordStore;
use crate::services::{
    AuthService, BookingMetrics, BookingRateLimiter, BookingWorkflow, Clock, NotificationHub,
    SessionRegistry,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthService,
    pub notifications: NotificationHub,
    pub bookings: BookingWorkflow,
    pub metrics: BookingMetrics,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let metrics = BookingMetrics::new()?;
        let notifications = NotificationHub::new(config.notification_buffer);
        let auth = AuthService::new(
            JwtConfig::from(&config),
            config.bcrypt_cost,
            SessionRegistry::new(),
        );
        let bookings = BookingWorkflow::new(
            store.clone(),
            clock.clone(),
            BookingRateLimiter::from_secs(config.booking_cooldown_secs),
            notifications.clone(),
            metrics.clone(),
        );

        Ok(Self {
            config,
            store,
            clock,
            auth,
            notifications,
            bookings,
            metrics,
        })
    }
}
