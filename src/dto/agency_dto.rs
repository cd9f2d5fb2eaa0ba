use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::agency::AgencyChanges;
use crate::utils::validation::{non_empty, validate_not_blank, validate_phone};

// Request para registrar la agencia del usuario autenticado
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgencyRequest {
    #[validate(custom = "validate_not_blank", length(max = 200))]
    pub company_name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

// Request para actualizar el perfil; los campos ausentes no cambian
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateAgencyRequest {
    #[validate(custom = "validate_not_blank", length(max = 200))]
    pub company_name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl From<UpdateAgencyRequest> for AgencyChanges {
    fn from(request: UpdateAgencyRequest) -> Self {
        Self {
            company_name: non_empty(request.company_name),
            contact_email: non_empty(request.contact_email),
            contact_phone: non_empty(request.contact_phone),
            address: non_empty(request.address),
            city: non_empty(request.city),
            state: non_empty(request.state),
            postal_code: non_empty(request.postal_code),
            website: non_empty(request.website),
            description: non_empty(request.description),
        }
    }
}

// Resumen de flota para el dashboard
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub agency_id: Uuid,
    pub company_name: String,
    pub total_vehicles: usize,
    pub available_vehicles: usize,
    pub average_daily_rate: Decimal,
}

impl DashboardSummary {
    pub fn from_rates(
        agency_id: Uuid,
        company_name: String,
        rates: impl IntoIterator<Item = (Decimal, bool)>,
    ) -> Self {
        let mut total = 0usize;
        let mut available = 0usize;
        let mut sum = Decimal::ZERO;
        for (rate, is_available) in rates {
            total += 1;
            sum += rate;
            if is_available {
                available += 1;
            }
        }

        let average_daily_rate = if total == 0 {
            Decimal::ZERO
        } else {
            (sum / Decimal::from(total)).round_dp(2)
        };

        Self {
            agency_id,
            company_name,
            total_vehicles: total,
            available_vehicles: available,
            average_daily_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_averages_daily_rates() {
        let summary = DashboardSummary::from_rates(
            Uuid::nil(),
            "Fleet".to_string(),
            vec![
                (Decimal::new(4000, 2), true),
                (Decimal::new(6000, 2), false),
                (Decimal::new(5500, 2), true),
            ],
        );

        assert_eq!(summary.total_vehicles, 3);
        assert_eq!(summary.available_vehicles, 2);
        assert_eq!(summary.average_daily_rate, Decimal::new(5167, 2));
    }

    #[test]
    fn test_empty_fleet_has_zero_average() {
        let summary = DashboardSummary::from_rates(Uuid::nil(), "Fleet".to_string(), Vec::new());
        assert_eq!(summary.total_vehicles, 0);
        assert_eq!(summary.average_daily_rate, Decimal::ZERO);
    }

    #[test]
    fn test_blank_update_fields_are_ignored() {
        let changes = AgencyChanges::from(UpdateAgencyRequest {
            city: Some("  ".to_string()),
            website: Some("https://fleet.test".to_string()),
            ..Default::default()
        });
        assert!(changes.city.is_none());
        assert_eq!(changes.website.as_deref(), Some("https://fleet.test"));
    }
}
