use axum::extract::State;
use axum_extra::extract::Multipart;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{Account, CostCenter, Employee, Expense, ExpenseFormRows, ExpenseRow},
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
    let employees: Vec<Employee> =
        sqlx::query_as("SELECT id, name FROM employees WHERE company_id = $1 ORDER BY name")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(json!({
        "accounts": accounts,
        "cost_centers": cost_centers,
        "employees": employees,
    })))
}

pub async fn list(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<Expense>>, ApiError> {
    let expenses: Vec<Expense> = sqlx::query_as(
        "SELECT * FROM expenses WHERE company_id = $1 ORDER BY expense_date DESC, created_at DESC",
    )
    .bind(session.company_id)
    .fetch_all(&db)
    .await?;

    Ok(ApiResponse::ok(expenses))
}

/// Bulk save from the multi-section entry form. The body is multipart with
/// one repeated field per column plus an optional `attachment` file; all
/// rows commit in a single transaction.
pub async fn save(
    State(db): State<Database>,
    session: TenantSession,
    multipart: Multipart,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let (form, attachment) = parse_save_multipart(multipart).await?;
    let rows = form.into_rows()?;
    let attachment_url = save_attachment(attachment, "expenses").await?;

    // A failed transaction must not leave the stored attachment orphaned
    if let Err(err) = insert_rows(&db, session.company_id, &rows, &attachment_url).await {
        if let Some(url) = &attachment_url {
            remove_attachment(url).await;
        }
        return Err(err);
    }

    Ok(ApiResponse::ok(json!({ "inserted": rows.len() })))
}

async fn insert_rows(
    db: &Database,
    company_id: i64,
    rows: &[ExpenseRow],
    attachment_url: &Option<String>,
) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO expenses \
             (id, company_id, main_type, expense_date, amount, taxable, net_amount, \
              account_code, cost_center_code, employee_id, description, attachment_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(&row.main_type)
        .bind(row.expense_date)
        .bind(row.amount)
        .bind(row.taxable)
        .bind(row.net_amount)
        .bind(&row.account_code)
        .bind(&row.cost_center_code)
        .bind(row.employee_id)
        .bind(&row.description)
        .bind(attachment_url)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn parse_save_multipart(
    mut multipart: Multipart,
) -> Result<(ExpenseFormRows, Option<AttachmentData>), ApiError> {
    let mut form = ExpenseFormRows::default();
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
            form.push(&name, value);
        }
    }

    Ok((form, attachment))
}
