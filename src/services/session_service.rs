//! Proveedor de identidad y sesiones
//!
//! Alta, login, logout y resolución del usuario actual. Las sesiones son
//! JWT HS256 con un `sid` que se registra en `SessionRegistry`; revocar el
//! `sid` invalida el token aunque la firma y la expiración sigan siendo válidas.
//!
//! La expiración se mide siempre con el reloj real porque `jsonwebtoken`
//! valida `exp` contra él.

use std::collections::HashMap;
use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{Agency, NewAgency, NewUser, User, UserType};
use crate::repositories::{AgencyRepository, RecordStore, UserRepository};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, verify_token, JwtConfig};
use crate::utils::validation::normalize_email;

/// Sesión activa en memoria
#[derive(Clone, Debug)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Registro de sesiones vivas indexado por `sid`
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session_id: Uuid, record: SessionRecord) {
        self.sessions.write().await.insert(session_id, record);
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionRecord> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// `true` si la sesión existía
    pub async fn revoke(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    /// Limpiar sesiones expiradas
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Metadata opcional del alta: registra también la agencia
#[derive(Debug, Clone)]
pub struct AgencySignUp {
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct SignUpCommand {
    pub email: String,
    pub password: String,
    pub agency: Option<AgencySignUp>,
}

/// Sesión emitida
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct AuthService {
    jwt: JwtConfig,
    bcrypt_cost: u32,
    sessions: SessionRegistry,
}

impl AuthService {
    pub fn new(jwt: JwtConfig, bcrypt_cost: u32, sessions: SessionRegistry) -> Self {
        Self {
            jwt,
            bcrypt_cost,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Crear identidad (y agencia si viene la metadata) y abrir sesión
    pub async fn sign_up(
        &self,
        store: &dyn RecordStore,
        command: SignUpCommand,
        now: DateTime<Utc>,
    ) -> AppResult<Session> {
        let email = normalize_email(&command.email);
        let password_hash = hash_password(command.password, self.bcrypt_cost).await?;

        let user_type = if command.agency.is_some() {
            UserType::Agency
        } else {
            UserType::Renter
        };

        let user = store
            .insert_user(NewUser {
                email,
                password_hash,
                user_type,
                created_at: now,
            })
            .await?;

        info!(user_id = %user.id, user_type = ?user.user_type, "👤 User signed up");

        let mut agency_id = None;
        if let Some(metadata) = command.agency {
            // El usuario ya existe: si la agencia falla puede crearla luego con POST /api/agency
            match register_agency(store, &user, metadata.company_name, now).await {
                Ok(agency) => agency_id = Some(agency.id),
                Err(e) => error!(user_id = %user.id, "Agency registration during sign-up failed: {}", e),
            }
        }

        self.open_session(&user, agency_id).await
    }

    pub async fn sign_in(
        &self,
        store: &dyn RecordStore,
        email: &str,
        password: &str,
    ) -> AppResult<Session> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        let matches = verify_password(password.to_string(), user.password_hash.clone()).await?;
        if !matches {
            warn!(user_id = %user.id, "Failed sign-in attempt");
            return Err(invalid());
        }

        let agency_id = store.find_agency_by_user(user.id).await?.map(|a| a.id);

        info!(user_id = %user.id, "🔑 User signed in");
        self.open_session(&user, agency_id).await
    }

    pub async fn sign_out(&self, user: &AuthenticatedUser) -> bool {
        let revoked = self.sessions.revoke(user.session_id).await;
        info!(user_id = %user.user_id, revoked, "👋 User signed out");
        revoked
    }

    /// Resolver el usuario de un bearer token
    pub async fn current_user(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let claims = verify_token(token, &self.jwt)?;

        let session_id = Uuid::parse_str(&claims.sid)
            .map_err(|_| AppError::Unauthorized("Malformed session id".to_string()))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Malformed subject".to_string()))?;

        let record = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| AppError::Unauthorized("Session has been signed out".to_string()))?;

        if record.user_id != user_id {
            return Err(AppError::Unauthorized("Session does not match token".to_string()));
        }
        if record.is_expired(Utc::now()) {
            self.sessions.revoke(session_id).await;
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }

        Ok(AuthenticatedUser {
            user_id,
            session_id,
            email: record.email,
            user_type: record.user_type,
        })
    }

    async fn open_session(&self, user: &User, agency_id: Option<Uuid>) -> AppResult<Session> {
        let session_id = Uuid::new_v4();
        let (token, expires_at) = generate_token(
            user.id,
            session_id,
            &user.email,
            user.user_type,
            Utc::now(),
            &self.jwt,
        )?;

        self.sessions
            .insert(
                session_id,
                SessionRecord {
                    user_id: user.id,
                    email: user.email.clone(),
                    user_type: user.user_type,
                    expires_at,
                },
            )
            .await;

        Ok(Session {
            token,
            expires_at,
            user_id: user.id,
            email: user.email.clone(),
            user_type: user.user_type,
            agency_id,
        })
    }
}

/// bcrypt es CPU-bound: se ejecuta fuera de los workers del runtime
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

/// Alta de la agencia de un usuario; el contacto por defecto es su email
pub async fn register_agency(
    store: &dyn RecordStore,
    user: &User,
    company_name: String,
    now: DateTime<Utc>,
) -> AppResult<Agency> {
    let agency = store
        .insert_agency(NewAgency {
            user_id: user.id,
            company_name,
            contact_email: user.email.clone(),
            contact_phone: None,
            address: None,
            city: None,
            state: None,
            postal_code: None,
            website: None,
            description: None,
            created_at: now,
        })
        .await?;

    info!(agency_id = %agency.id, user_id = %user.id, "🏢 Agency registered");
    Ok(agency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            JwtConfig {
                secret: "test-secret".to_string(),
                expiration: 3600,
            },
            4,
            SessionRegistry::new(),
        )
    }

    fn sign_up_command(agency: Option<&str>) -> SignUpCommand {
        SignUpCommand {
            email: "  Owner@Fleet.Test ".to_string(),
            password: "correct horse".to_string(),
            agency: agency.map(|name| AgencySignUp {
                company_name: name.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_password_hashing_runs_off_the_runtime() {
        let hashed = hash_password("correct horse".to_string(), 4).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_agency_sign_up_creates_agency() {
        let store = MemoryStore::new();
        let auth = service();

        let session = auth
            .sign_up(&store, sign_up_command(Some("Fleet")), Utc::now())
            .await
            .unwrap();

        assert_eq!(session.email, "owner@fleet.test");
        assert_eq!(session.user_type, UserType::Agency);
        let agency = store.find_agency_by_user(session.user_id).await.unwrap().unwrap();
        assert_eq!(Some(agency.id), session.agency_id);
        assert_eq!(agency.contact_email, "owner@fleet.test");
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_conflict() {
        let store = MemoryStore::new();
        let auth = service();

        auth.sign_up(&store, sign_up_command(None), Utc::now()).await.unwrap();
        let second = auth.sign_up(&store, sign_up_command(None), Utc::now()).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let store = MemoryStore::new();
        let auth = service();
        auth.sign_up(&store, sign_up_command(None), Utc::now()).await.unwrap();

        let ok = auth.sign_in(&store, "owner@fleet.test", "correct horse").await;
        assert!(ok.is_ok());

        let wrong = auth.sign_in(&store, "owner@fleet.test", "battery staple").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let unknown = auth.sign_in(&store, "nobody@fleet.test", "correct horse").await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token() {
        let store = MemoryStore::new();
        let auth = service();
        let session = auth.sign_up(&store, sign_up_command(None), Utc::now()).await.unwrap();

        let user = auth.current_user(&session.token).await.unwrap();
        assert_eq!(user.user_id, session.user_id);

        assert!(auth.sign_out(&user).await);
        let after = auth.current_user(&session.token).await;
        assert!(matches!(after, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_sessions() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry
            .insert(
                Uuid::new_v4(),
                SessionRecord {
                    user_id: Uuid::new_v4(),
                    email: "a@b.test".to_string(),
                    user_type: UserType::Renter,
                    expires_at: now - chrono::Duration::seconds(1),
                },
            )
            .await;

        assert_eq!(registry.cleanup_expired(now).await, 1);
        assert_eq!(registry.len().await, 0);
    }
}
