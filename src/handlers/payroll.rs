use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{CreatePayrollRequest, PayrollItem, PayrollRun},
    response::ApiResponse,
};

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<PayrollRun>>, ApiError> {
    let runs: Vec<PayrollRun> = sqlx::query_as(
        "SELECT * FROM payroll_runs WHERE company_id = $1 ORDER BY month DESC, created_at DESC",
    )
    .bind(session.company_id)
    .fetch_all(&db)
    .await?;

    Ok(ApiResponse::ok(runs))
}

pub async fn get(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let run: PayrollRun =
        sqlx::query_as("SELECT * FROM payroll_runs WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("payroll run"))?;

    let items: Vec<PayrollItem> =
        sqlx::query_as("SELECT * FROM payroll_items WHERE payroll_id = $1 ORDER BY employee_name")
            .bind(id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(json!({ "payroll": run, "items": items })))
}

pub async fn create(
    State(db): State<Database>,
    session: TenantSession,
    Json(request): Json<CreatePayrollRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let payroll = request.validate()?;

    let mut tx = db.begin().await?;
    let payroll_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO payroll_runs (id, company_id, month, package, is_draft, total_net, created_at) \
         VALUES ($1, $2, $3, $4, true, $5, NOW())",
    )
    .bind(payroll_id)
    .bind(session.company_id)
    .bind(&payroll.month)
    .bind(&payroll.package)
    .bind(payroll.total_net)
    .execute(&mut *tx)
    .await?;

    for item in &payroll.items {
        sqlx::query(
            "INSERT INTO payroll_items \
             (id, payroll_id, employee_id, employee_name, base_salary, allowances, deductions, net) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(payroll_id)
        .bind(item.employee_id)
        .bind(&item.employee_name)
        .bind(item.base_salary)
        .bind(item.allowances)
        .bind(item.deductions)
        .bind(item.net)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(ApiResponse::ok(json!({
        "id": payroll_id,
        "total_net": payroll.total_net,
        "employees": payroll.items.len(),
    })))
}

pub async fn finalize(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    // Guard and flip in one statement so concurrent finalize calls cannot
    // both pass a pre-read check
    let result = sqlx::query(
        "UPDATE payroll_runs SET is_draft = false \
         WHERE id = $1 AND company_id = $2 AND is_draft = true",
    )
    .bind(id)
    .bind(session.company_id)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        ensure_run_exists(&db, id, session.company_id).await?;
        return Err(ApiError::business("payroll run is already finalized"));
    }
    Ok(ApiResponse::empty())
}

async fn ensure_run_exists(db: &Database, id: Uuid, company_id: i64) -> Result<(), ApiError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM payroll_runs WHERE id = $1 AND company_id = $2)",
    )
    .bind(id)
    .bind(company_id)
    .fetch_one(db)
    .await?;
    if !exists {
        return Err(ApiError::NotFound("payroll run"));
    }
    Ok(())
}

/// Drafts only. Items go first, then the header, in one transaction; the
/// header delete re-checks the draft flag so a concurrent finalize rolls
/// the whole thing back.
pub async fn delete(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM payroll_items WHERE payroll_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query(
        "DELETE FROM payroll_runs WHERE id = $1 AND company_id = $2 AND is_draft = true",
    )
    .bind(id)
    .bind(session.company_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        // Dropping the transaction restores the items
        ensure_run_exists(&db, id, session.company_id).await?;
        return Err(ApiError::business("a finalized payroll run cannot be deleted"));
    }
    tx.commit().await?;

    Ok(ApiResponse::empty())
}
