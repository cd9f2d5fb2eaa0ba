//! Modelo de User
//!
//! Identidades emitidas por el proveedor de sesiones. Una identidad de tipo
//! `agency` queda asociada a exactamente una fila de `agencies`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de usuario - mapea al ENUM user_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Agency,
    Renter,
}

/// User principal - mapea exactamente a la tabla users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}

/// Fila a insertar en users
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}
