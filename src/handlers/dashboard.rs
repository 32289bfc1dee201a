use axum::extract::State;
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    database::Database, error::ApiError, middleware::TenantSession, response::ApiResponse,
};

/// Headline numbers for the landing page, all scoped to the session company.
/// A query failure surfaces as a 500 rather than a page of silent zeros.
pub async fn stats(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let expense_total: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(net_amount), 0) FROM expenses WHERE company_id = $1",
    )
    .bind(session.company_id)
    .fetch_one(&db)
    .await?;

    let income_total: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total), 0) FROM income_records WHERE company_id = $1",
    )
    .bind(session.company_id)
    .fetch_one(&db)
    .await?;

    let open_invoices: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sales_invoices WHERE company_id = $1 AND status = 'due'",
    )
    .bind(session.company_id)
    .fetch_one(&db)
    .await?;

    let pending_shipments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shipments WHERE company_id = $1 AND status = 'pending'",
    )
    .bind(session.company_id)
    .fetch_one(&db)
    .await?;

    Ok(ApiResponse::ok(json!({
        "expense_total": expense_total,
        "income_total": income_total,
        "open_invoices": open_invoices,
        "pending_shipments": pending_shipments,
    })))
}
