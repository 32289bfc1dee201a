use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Company 1 is the platform operator itself and can never be deleted.
pub const PLATFORM_ROOT_COMPANY_ID: i64 = 1;

/// Lifetime of a freshly generated access token.
pub const TOKEN_VALIDITY_DAYS: i64 = 30;

/// Onboarding review state. Separate from `is_active`, which gates login
/// for an approved company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyStatus {
    Pending,
    Approved,
    Rejected,
}

impl CompanyStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approve and reject are review outcomes; only a pending company is
    /// under review.
    pub fn reviewable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn activatable(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// The platform operator's own company record can never be deleted.
pub fn company_deletable(id: i64) -> bool {
    id != PLATFORM_ROOT_COMPANY_ID
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub is_active: bool,
    pub access_token: Option<Uuid>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
}

impl CreateCompanyRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("company name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignSubscriptionRequest {
    pub company_id: i64,
    pub plan: String,
    pub expires_at: NaiveDate,
}

impl AssignSubscriptionRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.plan.trim().is_empty() {
            return Err(ApiError::validation("subscription plan is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_companies_are_reviewable() {
        assert!(CompanyStatus::Pending.reviewable());
        assert!(!CompanyStatus::Approved.reviewable());
        assert!(!CompanyStatus::Rejected.reviewable());
    }

    #[test]
    fn only_approved_companies_can_be_activated() {
        assert!(CompanyStatus::Approved.activatable());
        assert!(!CompanyStatus::Pending.activatable());
        assert!(!CompanyStatus::Rejected.activatable());
    }

    #[test]
    fn platform_root_company_is_undeletable() {
        assert!(!company_deletable(PLATFORM_ROOT_COMPANY_ID));
        assert!(company_deletable(2));
        assert!(company_deletable(9999));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [CompanyStatus::Pending, CompanyStatus::Approved, CompanyStatus::Rejected] {
            assert_eq!(CompanyStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CompanyStatus::parse("archived"), None);
    }
}
