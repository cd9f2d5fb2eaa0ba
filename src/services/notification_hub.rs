//! Fan-out de notificaciones a los dashboards de agencia
//!
//! Dos caminos para el mismo evento lógico:
//!
//! ```text
//!  booking insert/update ──▶ feed global ──▶ filtro por vehicle_ids ─┐
//!                                                                    ├─▶ DashboardSubscription
//!  insert OK ──▶ "new-booking" en topic agency-{id} ────────────────┘
//! ```
//!
//! Entrega best-effort: quien no está suscrito pierde el evento y un
//! suscriptor que se queda atrás recibe `Resync` y debe recargar.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{agency_topic, Booking};

/// Evento explícito que se emite tras crear una reserva
pub const NEW_BOOKING_EVENT: &str = "new-booking";

type TopicsMap = Arc<RwLock<HashMap<String, broadcast::Sender<TopicMessage>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// Fila cambiada en `bookings` (análogo al change data capture)
#[derive(Debug, Clone, Serialize)]
pub struct BookingChange {
    pub kind: ChangeKind,
    pub booking: Booking,
}

#[derive(Debug, Clone)]
pub struct TopicMessage {
    pub topic: String,
    pub event: String,
}

/// Lo que recibe un dashboard suscrito
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    BookingChange { kind: ChangeKind, booking: Booking },
    Broadcast { topic: String, event: String },
    /// Se perdieron mensajes; el cliente debe volver a pedir el listado
    Resync,
}

#[derive(Clone)]
pub struct NotificationHub {
    feed: broadcast::Sender<BookingChange>,
    topics: TopicsMap,
    buffer: usize,
}

impl NotificationHub {
    pub fn new(buffer: usize) -> Self {
        let buffer = buffer.max(1);
        let (feed, _) = broadcast::channel(buffer);
        Self {
            feed,
            topics: Arc::new(RwLock::new(HashMap::new())),
            buffer,
        }
    }

    /// Publicar un cambio en el feed global. Devuelve cuántos receptores lo vieron.
    pub fn publish_change(&self, kind: ChangeKind, booking: &Booking) -> usize {
        let change = BookingChange {
            kind,
            booking: booking.clone(),
        };
        match self.feed.send(change) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(booking_id = %booking.id, "No dashboard listening on the change feed");
                0
            }
        }
    }

    /// Emitir `event` en el topic de la agencia. Los topics sin suscriptores
    /// no se crean y los que se quedaron vacíos se eliminan aquí.
    pub async fn broadcast(&self, agency_id: Uuid, event: &str) -> usize {
        let topic = agency_topic(agency_id);
        let message = TopicMessage {
            topic: topic.clone(),
            event: event.to_string(),
        };

        let sent = {
            let topics = self.topics.read().await;
            match topics.get(&topic) {
                Some(sender) => sender.send(message).ok(),
                None => {
                    debug!(topic = %topic, event, "Broadcast without subscribers");
                    return 0;
                }
            }
        };

        match sent {
            Some(receivers) => receivers,
            None => {
                warn!(topic = %topic, event, "📭 Broadcast lost: all subscribers are gone");
                self.prune(&topic).await;
                0
            }
        }
    }

    /// Abrir una suscripción de dashboard para la agencia y su flota actual
    pub async fn subscribe(&self, agency_id: Uuid, vehicle_ids: HashSet<Uuid>) -> DashboardSubscription {
        let topic = agency_topic(agency_id);
        let topic_rx = {
            let mut topics = self.topics.write().await;
            topics
                .entry(topic.clone())
                .or_insert_with(|| broadcast::channel(self.buffer).0)
                .subscribe()
        };

        info!(topic = %topic, vehicles = vehicle_ids.len(), "📡 Dashboard subscribed");

        DashboardSubscription {
            agency_id,
            topic,
            vehicle_ids,
            feed_rx: self.feed.subscribe(),
            topic_rx,
            hub: self.clone(),
        }
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    pub async fn subscriber_count(&self, agency_id: Uuid) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(&agency_topic(agency_id))
            .map_or(0, |sender| sender.receiver_count())
    }

    async fn prune(&self, topic: &str) {
        let mut topics = self.topics.write().await;
        if topics.get(topic).is_some_and(|s| s.receiver_count() == 0) {
            topics.remove(topic);
            debug!(topic, "Topic pruned");
        }
    }
}

/// Handle de una sesión de dashboard abierta
pub struct DashboardSubscription {
    agency_id: Uuid,
    topic: String,
    vehicle_ids: HashSet<Uuid>,
    feed_rx: broadcast::Receiver<BookingChange>,
    topic_rx: broadcast::Receiver<TopicMessage>,
    hub: NotificationHub,
}

impl DashboardSubscription {
    pub fn agency_id(&self) -> Uuid {
        self.agency_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Reemplazar el conjunto de vehículos que filtra el feed
    pub fn refresh_vehicles(&mut self, vehicle_ids: HashSet<Uuid>) {
        self.vehicle_ids = vehicle_ids;
    }

    /// Siguiente evento para esta agencia; `None` cuando el hub se cerró
    pub async fn next(&mut self) -> Option<DashboardEvent> {
        loop {
            tokio::select! {
                change = self.feed_rx.recv() => match change {
                    Ok(change) if self.vehicle_ids.contains(&change.booking.vehicle_id) => {
                        return Some(DashboardEvent::BookingChange {
                            kind: change.kind,
                            booking: change.booking,
                        });
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(topic = %self.topic, skipped, "Dashboard lagging on change feed");
                        return Some(DashboardEvent::Resync);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
                message = self.topic_rx.recv() => match message {
                    Ok(message) => {
                        return Some(DashboardEvent::Broadcast {
                            topic: message.topic,
                            event: message.event,
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(topic = %self.topic, skipped, "Dashboard lagging on agency topic");
                        return Some(DashboardEvent::Resync);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
            }
        }
    }

    /// Cerrar la suscripción; el topic se elimina si era el último suscriptor
    pub async fn unsubscribe(self) {
        let DashboardSubscription {
            topic,
            feed_rx,
            topic_rx,
            hub,
            ..
        } = self;
        drop(feed_rx);
        drop(topic_rx);
        hub.prune(&topic).await;
        info!(topic = %topic, "Dashboard unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use chrono::{NaiveDate, Utc};

    fn booking_on(vehicle_id: Uuid) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            vehicle_id,
            customer_name: "Jane".to_string(),
            customer_email: "jane@example.com".to_string(),
            phone_number: None,
            notes: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            status: BookingStatus::Pending,
            ip_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_own_fleet() {
        let hub = NotificationHub::new(16);
        let a1 = Uuid::new_v4();
        let a1_vehicle = Uuid::new_v4();
        let a2_vehicle = Uuid::new_v4();

        let mut subscription = hub.subscribe(a1, HashSet::from([a1_vehicle])).await;

        hub.publish_change(ChangeKind::Insert, &booking_on(a2_vehicle));
        let mine = booking_on(a1_vehicle);
        hub.publish_change(ChangeKind::Insert, &mine);

        match subscription.next().await {
            Some(DashboardEvent::BookingChange { kind, booking }) => {
                assert_eq!(kind, ChangeKind::Insert);
                assert_eq!(booking.id, mine.id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_agency_topic() {
        let hub = NotificationHub::new(16);
        let a1 = Uuid::new_v4();
        let a2 = Uuid::new_v4();

        let mut subscription = hub.subscribe(a1, HashSet::new()).await;

        assert_eq!(hub.broadcast(a2, NEW_BOOKING_EVENT).await, 0);
        assert_eq!(hub.broadcast(a1, NEW_BOOKING_EVENT).await, 1);

        match subscription.next().await {
            Some(DashboardEvent::Broadcast { topic, event }) => {
                assert_eq!(topic, agency_topic(a1));
                assert_eq!(event, NEW_BOOKING_EVENT);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let hub = NotificationHub::new(1);
        let vehicle = Uuid::new_v4();
        let mut subscription = hub.subscribe(Uuid::new_v4(), HashSet::from([vehicle])).await;

        for _ in 0..3 {
            hub.publish_change(ChangeKind::Update, &booking_on(vehicle));
        }

        assert!(matches!(subscription.next().await, Some(DashboardEvent::Resync)));
    }

    #[tokio::test]
    async fn test_unsubscribe_prunes_empty_topic() {
        let hub = NotificationHub::new(8);
        let agency = Uuid::new_v4();

        let first = hub.subscribe(agency, HashSet::new()).await;
        let second = hub.subscribe(agency, HashSet::new()).await;
        assert_eq!(hub.subscriber_count(agency).await, 2);

        first.unsubscribe().await;
        assert_eq!(hub.topic_count().await, 1);

        second.unsubscribe().await;
        assert_eq!(hub.topic_count().await, 0);
    }

    #[test]
    fn test_dashboard_event_is_tagged() {
        let json = serde_json::to_value(DashboardEvent::Broadcast {
            topic: "agency-1".to_string(),
            event: NEW_BOOKING_EVENT.to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "broadcast");
        assert_eq!(json["event"], "new-booking");

        let resync = serde_json::to_value(DashboardEvent::Resync).unwrap();
        assert_eq!(resync["type"], "resync");
    }
}
