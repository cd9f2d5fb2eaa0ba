//! Métricas Prometheus del workflow de reservas
//!
//! Registry propio (no el global) para que cada `AppState` de test tenga
//! sus contadores aislados. Se exponen en texto en `GET /metrics`.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct BookingMetrics {
    bookings_created: IntCounter,
    rate_limit_denials: IntCounter,
    transitions: IntCounterVec,
    notifications_published: IntCounterVec,
    registry: Registry,
}

impl BookingMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("rental_hub".to_string()), None)?;

        let bookings_created =
            IntCounter::new("bookings_created_total", "Booking requests accepted as pending")?;
        registry.register(Box::new(bookings_created.clone()))?;

        let rate_limit_denials = IntCounter::new(
            "booking_rate_limit_denials_total",
            "Booking requests refused by the per (vehicle, ip) cooldown",
        )?;
        registry.register(Box::new(rate_limit_denials.clone()))?;

        let transitions = IntCounterVec::new(
            Opts::new("booking_transitions_total", "Booking status transitions applied"),
            &["transition"],
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let notifications_published = IntCounterVec::new(
            Opts::new(
                "notifications_published_total",
                "Dashboard notifications published by path",
            ),
            &["path"],
        )?;
        registry.register(Box::new(notifications_published.clone()))?;

        Ok(Self {
            bookings_created,
            rate_limit_denials,
            transitions,
            notifications_published,
            registry,
        })
    }

    pub fn record_booking_created(&self) {
        self.bookings_created.inc();
    }

    pub fn record_rate_limit_denial(&self) {
        self.rate_limit_denials.inc();
    }

    pub fn record_transition(&self, transition: &str) {
        self.transitions.with_label_values(&[transition]).inc();
    }

    /// `path` es `change_feed` o `broadcast`
    pub fn record_notification(&self, path: &str) {
        self.notifications_published.with_label_values(&[path]).inc();
    }

    /// Formato de exposición de texto de Prometheus
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
