use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "auth_session";

/// Tenant scope for a request, parsed from the `auth_session` cookie.
///
/// Handlers take this as an extractor argument, so every query path starts
/// from an authenticated `company_id` rather than trusting a query-string
/// parameter. A request without a valid session never reaches a handler.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantSession {
    pub company_id: i64,
    pub user_id: Uuid,
    #[serde(default)]
    pub is_admin: bool,
}

fn parse_session(raw: &str) -> Option<TenantSession> {
    serde_json::from_str(raw).ok()
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        let cookie = cookies.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
        parse_session(cookie.value()).ok_or(ApiError::Unauthorized)
    }
}

/// Session that additionally carries the platform-admin flag. Used by the
/// company onboarding routes.
#[derive(Debug, Clone)]
pub struct AdminSession(pub TenantSession);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = TenantSession::from_request_parts(parts, state).await?;
        if !session.is_admin {
            return Err(ApiError::Forbidden("admin access required".into()));
        }
        Ok(AdminSession(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_session_blob() {
        let session = parse_session(
            r#"{"company_id": 12, "user_id": "7f9c24e8-3b0d-4f0a-9f26-1d41c3562f4e", "is_admin": true}"#,
        )
        .unwrap();
        assert_eq!(session.company_id, 12);
        assert!(session.is_admin);
    }

    #[test]
    fn admin_flag_defaults_to_false() {
        let session = parse_session(
            r#"{"company_id": 3, "user_id": "7f9c24e8-3b0d-4f0a-9f26-1d41c3562f4e"}"#,
        )
        .unwrap();
        assert!(!session.is_admin);
    }

    #[test]
    fn rejects_blob_without_company() {
        assert!(parse_session(r#"{"user_id": "7f9c24e8-3b0d-4f0a-9f26-1d41c3562f4e"}"#).is_none());
        assert!(parse_session("not json").is_none());
    }
}
