use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{
        compute_totals, CreateInvoiceRequest, InvoiceAdjustment, InvoiceItem, InvoiceStatus,
        SalesInvoice,
    },
    numbering::{next_number, DocumentKind},
    response::ApiResponse,
};

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<SalesInvoice>>, ApiError> {
    let invoices: Vec<SalesInvoice> = sqlx::query_as(
        "SELECT * FROM sales_invoices WHERE company_id = $1 ORDER BY created_at DESC",
    )
    .bind(session.company_id)
    .fetch_all(&db)
    .await?;

    Ok(ApiResponse::ok(invoices))
}

pub async fn get(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let invoice: SalesInvoice =
        sqlx::query_as("SELECT * FROM sales_invoices WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;

    let items: Vec<InvoiceItem> =
        sqlx::query_as("SELECT * FROM invoice_items WHERE invoice_id = $1 ORDER BY description")
            .bind(id)
            .fetch_all(&db)
            .await?;
    let adjustments: Vec<InvoiceAdjustment> =
        sqlx::query_as("SELECT * FROM invoice_adjustments WHERE invoice_id = $1")
            .bind(id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(json!({
        "invoice": invoice,
        "items": items,
        "adjustments": adjustments,
    })))
}

/// Creates the header, its items, and its adjustments in one transaction, so
/// a failure partway leaves nothing behind.
pub async fn create(
    State(db): State<Database>,
    session: TenantSession,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    if request.client_name.trim().is_empty() {
        return Err(ApiError::validation("client name is required"));
    }
    if request.due_date < request.issue_date {
        return Err(ApiError::validation("due date cannot precede the issue date"));
    }
    let totals = compute_totals(request.items, request.adjustments)?;

    let mut tx = db.begin().await?;
    let value = next_number(&mut *tx, session.company_id, DocumentKind::SalesInvoice).await?;
    let number = DocumentKind::SalesInvoice.format_number(value);
    let invoice_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO sales_invoices \
         (id, company_id, number, client_id, client_name, issue_date, due_date, status, \
          subtotal, tax_total, total, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())",
    )
    .bind(invoice_id)
    .bind(session.company_id)
    .bind(&number)
    .bind(request.client_id)
    .bind(request.client_name.trim())
    .bind(request.issue_date)
    .bind(request.due_date)
    .bind(InvoiceStatus::Draft.as_str())
    .bind(totals.subtotal)
    .bind(totals.tax_total)
    .bind(totals.total)
    .execute(&mut *tx)
    .await?;

    for item in &totals.items {
        sqlx::query(
            "INSERT INTO invoice_items \
             (id, invoice_id, description, quantity, unit_price, pre_tax, tax, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.pre_tax)
        .bind(item.tax)
        .bind(item.total)
        .execute(&mut *tx)
        .await?;
    }

    for adjustment in &totals.adjustments {
        sqlx::query(
            "INSERT INTO invoice_adjustments (id, invoice_id, kind, description, amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(adjustment.kind.as_str())
        .bind(&adjustment.description)
        .bind(adjustment.amount)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(ApiResponse::ok(json!({
        "id": invoice_id,
        "number": number,
        "total": totals.total,
    })))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let next = InvoiceStatus::parse(&request.status)
        .ok_or_else(|| ApiError::validation("status must be draft, due or paid"))?;

    let current_raw: String =
        sqlx::query_scalar("SELECT status FROM sales_invoices WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;
    let current = InvoiceStatus::parse(&current_raw)
        .ok_or_else(|| ApiError::business(format!("invoice has unknown status '{}'", current_raw)))?;

    if !current.can_transition_to(next) {
        return Err(ApiError::business(format!(
            "invoice cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    // Conditional on the status we validated against, so a concurrent
    // transition cannot slip through between the read and the write
    let result = sqlx::query(
        "UPDATE sales_invoices SET status = $1 \
         WHERE id = $2 AND company_id = $3 AND status = $4",
    )
    .bind(next.as_str())
    .bind(id)
    .bind(session.company_id)
    .bind(current.as_str())
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::business(
            "invoice status changed concurrently; reload and retry",
        ));
    }

    Ok(ApiResponse::ok(json!({ "status": next.as_str() })))
}

/// Hard delete is only legal for drafts; a finalized tax invoice must be
/// reversed with a credit note.
pub async fn delete(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let status: String =
        sqlx::query_scalar("SELECT status FROM sales_invoices WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;

    let current = InvoiceStatus::parse(&status)
        .ok_or_else(|| ApiError::business(format!("invoice has unknown status '{}'", status)))?;
    if !current.deletable() {
        return Err(ApiError::business(
            "a finalized tax invoice cannot be deleted; issue a credit note to reverse it",
        ));
    }

    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM invoice_adjustments WHERE invoice_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    // Recheck inside the transaction; a concurrent finalize rolls the
    // child deletes back
    let result = sqlx::query(
        "DELETE FROM sales_invoices WHERE id = $1 AND company_id = $2 AND status = 'draft'",
    )
    .bind(id)
    .bind(session.company_id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::business(
            "a finalized tax invoice cannot be deleted; issue a credit note to reverse it",
        ));
    }
    tx.commit().await?;

    Ok(ApiResponse::empty())
}
