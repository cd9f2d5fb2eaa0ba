use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::models::agency::{Agency, AgencyChanges, NewAgency};
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait AgencyRepository: Send + Sync {
    /// Falla con `Conflict` si el usuario ya tiene una agencia
    async fn insert_agency(&self, agency: NewAgency) -> AppResult<Agency>;

    async fn find_agency_by_user(&self, user_id: Uuid) -> AppResult<Option<Agency>>;

    /// Agencia del usuario; `Forbidden` si la cuenta no tiene ninguna
    async fn require_agency_of(&self, user_id: Uuid) -> AppResult<Agency> {
        self.find_agency_by_user(user_id).await?.ok_or_else(|| {
            AppError::Forbidden("No agency is registered for this account".to_string())
        })
    }

    async fn update_agency(
        &self,
        id: Uuid,
        changes: AgencyChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Agency>>;
}

#[async_trait]
impl AgencyRepository for PgStore {
    async fn insert_agency(&self, agency: NewAgency) -> AppResult<Agency> {
        let result = sqlx::query_as::<_, Agency>(
            r#"
            INSERT INTO agencies (
                id, user_id, company_name, contact_email, contact_phone, address,
                city, state, postal_code, website, description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(agency.user_id)
        .bind(&agency.company_name)
        .bind(&agency.contact_email)
        .bind(&agency.contact_phone)
        .bind(&agency.address)
        .bind(&agency.city)
        .bind(&agency.state)
        .bind(&agency.postal_code)
        .bind(&agency.website)
        .bind(&agency.description)
        .bind(agency.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_agency_by_user(&self, user_id: Uuid) -> AppResult<Option<Agency>> {
        let result = sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn update_agency(
        &self,
        id: Uuid,
        changes: AgencyChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Agency>> {
        let result = sqlx::query_as::<_, Agency>(
            r#"
            UPDATE agencies
            SET company_name = COALESCE($2, company_name),
                contact_email = COALESCE($3, contact_email),
                contact_phone = COALESCE($4, contact_phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                postal_code = COALESCE($8, postal_code),
                website = COALESCE($9, website),
                description = COALESCE($10, description),
                updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.company_name)
        .bind(changes.contact_email)
        .bind(changes.contact_phone)
        .bind(changes.address)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.postal_code)
        .bind(changes.website)
        .bind(changes.description)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }
}
