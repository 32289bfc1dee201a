use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{
        ActivityLogEntry, CreateSubUserRequest, SubUser, SubUserStatus, UpdateSubUserRequest,
    },
    response::ApiResponse,
};

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<SubUser>>, ApiError> {
    let users: Vec<SubUser> = sqlx::query_as(
        "SELECT * FROM sub_users WHERE company_id = $1 AND status <> 'deleted' ORDER BY name",
    )
    .bind(session.company_id)
    .fetch_all(&db)
    .await?;

    Ok(ApiResponse::ok(users))
}

pub async fn create(
    State(db): State<Database>,
    session: TenantSession,
    Json(request): Json<CreateSubUserRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    request.validate()?;

    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sub_users \
         WHERE company_id = $1 AND email = $2 AND status <> 'deleted')",
    )
    .bind(session.company_id)
    .bind(request.email.trim())
    .fetch_one(&db)
    .await?;
    if duplicate {
        return Err(ApiError::business("a sub-user with this email already exists"));
    }

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO sub_users \
         (id, company_id, email, name, permissions, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())",
    )
    .bind(id)
    .bind(session.company_id)
    .bind(request.email.trim())
    .bind(request.name.trim())
    .bind(&request.permissions)
    .bind(SubUserStatus::Active.as_str())
    .execute(&db)
    .await?;

    Ok(ApiResponse::ok(json!({ "id": id })))
}

pub async fn update(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubUserRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let new_status = request.validated_status()?;

    let current: SubUser =
        sqlx::query_as("SELECT * FROM sub_users WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("sub-user"))?;
    if SubUserStatus::parse(&current.status) == Some(SubUserStatus::Deleted) {
        return Err(ApiError::business("a deleted sub-user cannot be edited"));
    }

    let name = request.name.unwrap_or(current.name);
    if name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let permissions = request.permissions.unwrap_or(current.permissions);
    let status = new_status.map_or(current.status, |s| s.as_str().to_string());

    // Conditional so a concurrent delete cannot be overwritten
    let result = sqlx::query(
        "UPDATE sub_users SET name = $1, permissions = $2, status = $3, updated_at = NOW() \
         WHERE id = $4 AND company_id = $5 AND status <> 'deleted'",
    )
    .bind(name.trim())
    .bind(&permissions)
    .bind(&status)
    .bind(id)
    .bind(session.company_id)
    .execute(&db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::business("a deleted sub-user cannot be edited"));
    }

    Ok(ApiResponse::empty())
}

/// Soft delete: the row stays for the activity history, the status flips.
pub async fn delete(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    // Guard and flip in one statement; two concurrent deletes cannot both
    // report success
    let result = sqlx::query(
        "UPDATE sub_users SET status = 'deleted', updated_at = NOW() \
         WHERE id = $1 AND company_id = $2 AND status <> 'deleted'",
    )
    .bind(id)
    .bind(session.company_id)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sub_users WHERE id = $1 AND company_id = $2)",
        )
        .bind(id)
        .bind(session.company_id)
        .fetch_one(&db)
        .await?;
        if !exists {
            return Err(ApiError::NotFound("sub-user"));
        }
        return Err(ApiError::business("sub-user is already deleted"));
    }

    Ok(ApiResponse::empty())
}

pub async fn activity(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<ActivityLogEntry>>, ApiError> {
    let owned: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sub_users WHERE id = $1 AND company_id = $2)",
    )
    .bind(id)
    .bind(session.company_id)
    .fetch_one(&db)
    .await?;
    if !owned {
        return Err(ApiError::NotFound("sub-user"));
    }

    let entries: Vec<ActivityLogEntry> = sqlx::query_as(
        "SELECT * FROM sub_user_activity WHERE sub_user_id = $1 \
         ORDER BY created_at DESC LIMIT 100",
    )
    .bind(id)
    .fetch_all(&db)
    .await?;

    Ok(ApiResponse::ok(entries))
}
