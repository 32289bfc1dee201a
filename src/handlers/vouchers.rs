use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{Account, SaveVoucherRequest, Voucher, VoucherKind},
    numbering::{next_number, peek_next_number},
    response::ApiResponse,
};

#[derive(Deserialize)]
pub struct MetadataQuery {
    pub kind: String,
}

pub async fn metadata(
    State(db): State<Database>,
    session: TenantSession,
    Query(query): Query<MetadataQuery>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let kind = VoucherKind::parse(&query.kind)
        .ok_or_else(|| ApiError::validation("kind must be payment or receipt"))?;

    let accounts: Vec<Account> =
        sqlx::query_as("SELECT code, name FROM accounts WHERE company_id = $1 ORDER BY code")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;
    // Preview only; the number is reserved when the voucher is saved
    let next = peek_next_number(&db, session.company_id, kind.document_kind()).await?;

    Ok(ApiResponse::ok(json!({
        "accounts": accounts,
        "next_number": next,
    })))
}

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<Voucher>>, ApiError> {
    let vouchers: Vec<Voucher> =
        sqlx::query_as("SELECT * FROM vouchers WHERE company_id = $1 ORDER BY created_at DESC")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(vouchers))
}

pub async fn save(
    State(db): State<Database>,
    session: TenantSession,
    Json(request): Json<SaveVoucherRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let voucher = request.validate()?;

    if let Some(id) = voucher.id {
        let existing_kind: String =
            sqlx::query_scalar("SELECT kind FROM vouchers WHERE id = $1 AND company_id = $2")
                .bind(id)
                .bind(session.company_id)
                .fetch_optional(&db)
                .await?
                .ok_or(ApiError::NotFound("voucher"))?;
        voucher.kind.require_same(&existing_kind)?;

        let result = sqlx::query(
            "UPDATE vouchers SET debit_account = $1, credit_account = $2, amount = $3, \
             tax_rate = $4, tax_value = $5, total = $6, payee = $7, payment_method = $8 \
             WHERE id = $9 AND company_id = $10",
        )
        .bind(&voucher.debit_account)
        .bind(&voucher.credit_account)
        .bind(voucher.amount)
        .bind(voucher.tax_rate)
        .bind(voucher.tax_value)
        .bind(voucher.total)
        .bind(&voucher.payee)
        .bind(&voucher.payment_method)
        .bind(id)
        .bind(session.company_id)
        .execute(&db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("voucher"));
        }
        return Ok(ApiResponse::ok(json!({ "id": id })));
    }

    // Number and insert commit together so a failed insert never burns a
    // number that a concurrent save could duplicate
    let mut tx = db.begin().await?;
    let value = next_number(&mut *tx, session.company_id, voucher.kind.document_kind()).await?;
    let number = voucher.kind.document_kind().format_number(value);
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO vouchers \
         (id, company_id, kind, number, debit_account, credit_account, amount, tax_rate, \
          tax_value, total, payee, payment_method, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())",
    )
    .bind(id)
    .bind(session.company_id)
    .bind(voucher.kind.as_str())
    .bind(&number)
    .bind(&voucher.debit_account)
    .bind(&voucher.credit_account)
    .bind(voucher.amount)
    .bind(voucher.tax_rate)
    .bind(voucher.tax_value)
    .bind(voucher.total)
    .bind(&voucher.payee)
    .bind(&voucher.payment_method)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(json!({ "id": id, "number": number })))
}

pub async fn delete(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let result = sqlx::query("DELETE FROM vouchers WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(session.company_id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("voucher"));
    }
    Ok(ApiResponse::empty())
}
