use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubUserStatus {
    Active,
    Suspended,
    Deleted,
}

impl SubUserStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SubUser {
    pub id: Uuid,
    pub company_id: i64,
    pub email: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub sub_user_id: Uuid,
    pub action: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CreateSubUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name is required"));
        }
        if !self.email.contains('@') {
            return Err(ApiError::validation("a valid email is required"));
        }
        Ok(())
    }
}

/// Partial update; absent fields keep their current value. Status may move
/// between active and suspended here; deletion goes through DELETE.
#[derive(Debug, Deserialize)]
pub struct UpdateSubUserRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub status: Option<String>,
}

impl UpdateSubUserRequest {
    pub fn validated_status(&self) -> Result<Option<SubUserStatus>, ApiError> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(raw) => match SubUserStatus::parse(raw) {
                Some(SubUserStatus::Deleted) => Err(ApiError::validation(
                    "use the delete endpoint to remove a sub-user",
                )),
                Some(status) => Ok(Some(status)),
                None => Err(ApiError::validation("unknown sub-user status")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_and_plausible_email() {
        let ok = CreateSubUserRequest {
            email: "ops@acme.example".into(),
            name: "Ops Clerk".into(),
            permissions: vec!["expenses:write".into()],
        };
        assert!(ok.validate().is_ok());

        let bad_email = CreateSubUserRequest { email: "nope".into(), name: "X".into(), permissions: vec![] };
        assert!(bad_email.validate().is_err());

        let no_name = CreateSubUserRequest { email: "a@b.c".into(), name: " ".into(), permissions: vec![] };
        assert!(no_name.validate().is_err());
    }

    #[test]
    fn update_cannot_set_deleted_status() {
        let update = UpdateSubUserRequest {
            name: None,
            permissions: None,
            status: Some("deleted".into()),
        };
        assert!(update.validated_status().is_err());

        let suspend = UpdateSubUserRequest {
            name: None,
            permissions: None,
            status: Some("suspended".into()),
        };
        assert_eq!(suspend.validated_status().unwrap(), Some(SubUserStatus::Suspended));

        let untouched = UpdateSubUserRequest { name: None, permissions: None, status: None };
        assert_eq!(untouched.validated_status().unwrap(), None);
    }
}
