//! Modelo de Agency
//!
//! Cuenta de un operador de flota. Mapea exactamente a la tabla `agencies`;
//! `user_id` es único (una agencia por identidad).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Agency principal - mapea exactamente a la tabla agencies
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agency {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agency {
    /// Topic del canal de notificaciones de esta agencia
    pub fn channel_topic(&self) -> String {
        agency_topic(self.id)
    }
}

/// Nombre del topic de broadcast de una agencia: `agency-{id}`
pub fn agency_topic(agency_id: Uuid) -> String {
    format!("agency-{}", agency_id)
}

/// Fila a insertar en agencies
#[derive(Debug, Clone)]
pub struct NewAgency {
    pub user_id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Campos editables del perfil; `None` conserva el valor actual
#[derive(Debug, Clone, Default)]
pub struct AgencyChanges {
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

impl AgencyChanges {
    /// Aplicar los cambios sobre una fila existente
    pub fn apply_to(self, agency: &mut Agency, now: DateTime<Utc>) {
        if let Some(v) = self.company_name {
            agency.company_name = v;
        }
        if let Some(v) = self.contact_email {
            agency.contact_email = v;
        }
        agency.contact_phone = self.contact_phone.or(agency.contact_phone.take());
        agency.address = self.address.or(agency.address.take());
        agency.city = self.city.or(agency.city.take());
        agency.state = self.state.or(agency.state.take());
        agency.postal_code = self.postal_code.or(agency.postal_code.take());
        agency.website = self.website.or(agency.website.take());
        agency.description = self.description.or(agency.description.take());
        agency.updated_at = now;
    }
}
