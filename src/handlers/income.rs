use axum::extract::{Path, State};
use axum_extra::extract::Multipart;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{Account, CostCenter, IncomeForm, IncomeRecord, PaymentMethodRow},
    response::ApiResponse,
    utils::upload::{remove_attachment, save_attachment, AttachmentData},
};

pub async fn metadata(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let accounts: Vec<Account> =
        sqlx::query_as("SELECT code, name FROM accounts WHERE company_id = $1 ORDER BY code")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;
    let cost_centers: Vec<CostCenter> =
        sqlx::query_as("SELECT code, name FROM cost_centers WHERE company_id = $1 ORDER BY code")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;
    let payment_methods: Vec<PaymentMethodRow> =
        sqlx::query_as("SELECT name FROM payment_methods WHERE company_id = $1 ORDER BY name")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(json!({
        "accounts": accounts,
        "cost_centers": cost_centers,
        "payment_methods": payment_methods,
    })))
}

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<IncomeRecord>>, ApiError> {
    let records: Vec<IncomeRecord> =
        sqlx::query_as("SELECT * FROM income_records WHERE company_id = $1 ORDER BY created_at DESC")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(records))
}

pub async fn save(
    State(db): State<Database>,
    session: TenantSession,
    multipart: Multipart,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let (form, attachment) = parse_income_multipart(multipart).await?;
    let income = form.validate()?;
    let attachment_url = save_attachment(attachment, "income").await?;

    let id = Uuid::new_v4();
    let insert = sqlx::query(
        "INSERT INTO income_records \
         (id, company_id, amount, vat_enabled, vat, total, account_code, cost_center_code, \
          payment_method, description, attachment_url, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())",
    )
    .bind(id)
    .bind(session.company_id)
    .bind(income.amount)
    .bind(income.vat_enabled)
    .bind(income.vat)
    .bind(income.total)
    .bind(&income.account_code)
    .bind(&income.cost_center_code)
    .bind(&income.payment_method)
    .bind(&income.description)
    .bind(&attachment_url)
    .execute(&db)
    .await;

    // A failed insert must not leave the stored attachment orphaned
    if let Err(err) = insert {
        if let Some(url) = &attachment_url {
            remove_attachment(url).await;
        }
        return Err(err.into());
    }

    Ok(ApiResponse::ok(json!({ "id": id, "vat": income.vat, "total": income.total })))
}

pub async fn delete(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let result = sqlx::query("DELETE FROM income_records WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(session.company_id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("income record"));
    }
    Ok(ApiResponse::empty())
}

async fn parse_income_multipart(
    mut multipart: Multipart,
) -> Result<(IncomeForm, Option<AttachmentData>), ApiError> {
    let mut form = IncomeForm::default();
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("malformed multipart body"))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "attachment" {
            let filename = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::validation("malformed attachment"))?;
            if filename.is_some() && !data.is_empty() {
                attachment = Some(AttachmentData { filename, data });
            }
        } else {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::validation("malformed multipart body"))?;
            let value = String::from_utf8(bytes.to_vec())
                .map_err(|_| ApiError::validation("form fields must be UTF-8"))?;
            form.set(&name, value);
        }
    }

    Ok((form, attachment))
}
