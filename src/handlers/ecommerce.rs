use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    middleware::TenantSession,
    models::{
        resolve_shipment_update, CreateOrderRequest, Order, PaymentStatus, Shipment,
        ShipmentStatus, UpdateShipmentRequest,
    },
    numbering::{next_number, DocumentKind},
    response::ApiResponse,
};

pub async fn list_orders(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<Order>>, ApiError> {
    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE company_id = $1 ORDER BY created_at DESC")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(orders))
}

pub async fn list_shipments(
    State(db): State<Database>,
    session: TenantSession,
) -> Result<ApiResponse<Vec<Shipment>>, ApiError> {
    let shipments: Vec<Shipment> =
        sqlx::query_as("SELECT * FROM shipments WHERE company_id = $1 ORDER BY created_at DESC")
            .bind(session.company_id)
            .fetch_all(&db)
            .await?;

    Ok(ApiResponse::ok(shipments))
}

/// Order and its pending shipment are created together or not at all.
pub async fn create_order(
    State(db): State<Database>,
    session: TenantSession,
    Json(request): Json<CreateOrderRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    request.validate()?;

    let mut tx = db.begin().await?;
    let value = next_number(&mut *tx, session.company_id, DocumentKind::Order).await?;
    let number = DocumentKind::Order.format_number(value);
    let order_id = Uuid::new_v4();
    let shipment_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO orders (id, company_id, number, customer_name, address, phone, total, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
    )
    .bind(order_id)
    .bind(session.company_id)
    .bind(&number)
    .bind(request.customer_name.trim())
    .bind(request.address.trim())
    .bind(request.phone.trim())
    .bind(request.total)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO shipments \
         (id, company_id, order_id, status, payment_status, address, phone, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())",
    )
    .bind(shipment_id)
    .bind(session.company_id)
    .bind(order_id)
    .bind(ShipmentStatus::Pending.as_str())
    .bind(PaymentStatus::Unpaid.as_str())
    .bind(request.address.trim())
    .bind(request.phone.trim())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::ok(json!({
        "order_id": order_id,
        "shipment_id": shipment_id,
        "number": number,
    })))
}

pub async fn update_shipment(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateShipmentRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let shipment: Shipment =
        sqlx::query_as("SELECT * FROM shipments WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(session.company_id)
            .fetch_optional(&db)
            .await?
            .ok_or(ApiError::NotFound("shipment"))?;

    let current_status = ShipmentStatus::parse(&shipment.status)
        .ok_or_else(|| ApiError::business(format!("shipment has unknown status '{}'", shipment.status)))?;
    let current_payment = PaymentStatus::parse(&shipment.payment_status)
        .unwrap_or(PaymentStatus::Unpaid);

    let (next_status, next_payment) =
        resolve_shipment_update(current_status, current_payment, &request)?;

    // Conditional on the status the transition was validated against
    let result = sqlx::query(
        "UPDATE shipments SET status = $1, payment_status = $2, updated_at = NOW() \
         WHERE id = $3 AND company_id = $4 AND status = $5",
    )
    .bind(next_status.as_str())
    .bind(next_payment.as_str())
    .bind(id)
    .bind(session.company_id)
    .bind(current_status.as_str())
    .execute(&db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::business(
            "shipment was updated concurrently; reload and retry",
        ));
    }

    Ok(ApiResponse::ok(json!({
        "status": next_status.as_str(),
        "payment_status": next_payment.as_str(),
    })))
}

pub async fn delete_shipment(
    State(db): State<Database>,
    session: TenantSession,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let result = sqlx::query(
        "DELETE FROM shipments WHERE id = $1 AND company_id = $2 \
         AND status IN ('pending', 'cancelled')",
    )
    .bind(id)
    .bind(session.company_id)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shipments WHERE id = $1 AND company_id = $2)",
        )
        .bind(id)
        .bind(session.company_id)
        .fetch_one(&db)
        .await?;
        if !exists {
            return Err(ApiError::NotFound("shipment"));
        }
        return Err(ApiError::business(
            "only a pending or cancelled shipment can be deleted",
        ));
    }

    Ok(ApiResponse::empty())
}
