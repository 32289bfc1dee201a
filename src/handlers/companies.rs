use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::AdminSession,
    models::{
        company_deletable, AssignSubscriptionRequest, Company, CompanyStatus,
        CreateCompanyRequest, TOKEN_VALIDITY_DAYS,
    },
    response::ApiResponse,
};

pub async fn list(
    State(db): State<Database>,
    _session: AdminSession,
) -> Result<ApiResponse<Vec<Company>>, ApiError> {
    let companies: Vec<Company> =
        sqlx::query_as("SELECT * FROM companies ORDER BY created_at DESC")
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(companies))
}

pub async fn create(
    State(db): State<Database>,
    _session: AdminSession,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    request.validate()?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO companies \
         (name, status, is_active, address, city, bank_name, iban, license_number, license_expiry, created_at) \
         VALUES ($1, $2, false, $3, $4, $5, $6, $7, $8, NOW()) \
         RETURNING id",
    )
    .bind(request.name.trim())
    .bind(CompanyStatus::Pending.as_str())
    .bind(&request.address)
    .bind(&request.city)
    .bind(&request.bank_name)
    .bind(&request.iban)
    .bind(&request.license_number)
    .bind(request.license_expiry)
    .fetch_one(&db)
    .await?;

    Ok(ApiResponse::ok(json!({ "id": id })))
}

async fn load_status(db: &Database, id: i64) -> Result<CompanyStatus, ApiError> {
    let raw: String = sqlx::query_scalar("SELECT status FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("company"))?;
    CompanyStatus::parse(&raw)
        .ok_or_else(|| ApiError::business(format!("company has unknown status '{}'", raw)))
}

/// Review outcomes only apply to a pending company; the status predicate is
/// part of the UPDATE so concurrent reviews cannot both land.
async fn review(db: &Database, id: i64, outcome: CompanyStatus, verb: &str) -> Result<(), ApiError> {
    let result = sqlx::query("UPDATE companies SET status = $1 WHERE id = $2 AND status = 'pending'")
        .bind(outcome.as_str())
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        let status = load_status(db, id).await?;
        if !status.reviewable() {
            return Err(ApiError::business(format!(
                "only a pending company can be {} (currently {})",
                verb,
                status.as_str()
            )));
        }
        return Err(ApiError::business("company status changed concurrently; retry"));
    }
    Ok(())
}

pub async fn approve(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    review(&db, id, CompanyStatus::Approved, "approved").await?;
    Ok(ApiResponse::empty())
}

pub async fn reject(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    review(&db, id, CompanyStatus::Rejected, "rejected").await?;
    Ok(ApiResponse::empty())
}

pub async fn activate(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let result = sqlx::query(
        "UPDATE companies SET is_active = true WHERE id = $1 AND status = 'approved'",
    )
    .bind(id)
    .execute(&db)
    .await?;
    if result.rows_affected() == 0 {
        let status = load_status(&db, id).await?;
        if !status.activatable() {
            return Err(ApiError::business(
                "a company must be approved before it can be activated",
            ));
        }
        return Err(ApiError::business("company status changed concurrently; retry"));
    }
    Ok(ApiResponse::empty())
}

pub async fn deactivate(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let result = sqlx::query("UPDATE companies SET is_active = false WHERE id = $1")
        .bind(id)
        .execute(&db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("company"));
    }
    Ok(ApiResponse::empty())
}

pub async fn generate_token(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let token = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::days(TOKEN_VALIDITY_DAYS);

    let result = sqlx::query(
        "UPDATE companies SET access_token = $1, token_expires_at = $2 WHERE id = $3",
    )
    .bind(token)
    .bind(expires_at)
    .bind(id)
    .execute(&db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("company"));
    }

    Ok(ApiResponse::ok(json!({
        "access_token": token,
        "expires_at": expires_at,
    })))
}

/// Removes the company and everything scoped to it. The platform root
/// company is undeletable.
pub async fn delete(
    State(db): State<Database>,
    _session: AdminSession,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    if !company_deletable(id) {
        return Err(ApiError::business("the platform company cannot be deleted"));
    }

    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM sub_users WHERE company_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM subscriptions WHERE company_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("company"));
    }
    tx.commit().await?;

    Ok(ApiResponse::empty())
}

pub async fn assign_subscription(
    State(db): State<Database>,
    _session: AdminSession,
    Json(request): Json<AssignSubscriptionRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    request.validate()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1)")
        .bind(request.company_id)
        .fetch_one(&db)
        .await?;
    if !exists {
        return Err(ApiError::NotFound("company"));
    }

    sqlx::query(
        "INSERT INTO subscriptions (company_id, plan, expires_at, assigned_at) \
         VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (company_id) \
         DO UPDATE SET plan = EXCLUDED.plan, expires_at = EXCLUDED.expires_at, assigned_at = NOW()",
    )
    .bind(request.company_id)
    .bind(request.plan.trim())
    .bind(request.expires_at)
    .execute(&db)
    .await?;

    Ok(ApiResponse::empty())
}
