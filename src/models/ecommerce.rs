use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Delivery pipeline. Forward one step at a time; cancel from any
/// non-terminal state. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentStatus {
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "out_for_delivery" => Some(Self::OutForDelivery),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        if next == Self::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::OutForDelivery)
                | (Self::OutForDelivery, Self::Delivered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(Self::Paid),
            "unpaid" => Some(Self::Unpaid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub company_id: i64,
    pub number: String,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Shipment {
    pub id: Uuid,
    pub company_id: i64,
    pub order_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub total: Decimal,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.customer_name.trim().is_empty()
            || self.address.trim().is_empty()
            || self.phone.trim().is_empty()
        {
            return Err(ApiError::validation(
                "customer name, address and phone are required",
            ));
        }
        if self.total < Decimal::ZERO {
            return Err(ApiError::validation("order total cannot be negative"));
        }
        Ok(())
    }
}

/// Either field may be present; both are applied in one request.
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// Resolves an update request against the current row. Re-sending the
/// current delivery status is a no-op, and marking a paid shipment paid
/// again succeeds and leaves it paid.
pub fn resolve_shipment_update(
    current_status: ShipmentStatus,
    current_payment: PaymentStatus,
    request: &UpdateShipmentRequest,
) -> Result<(ShipmentStatus, PaymentStatus), ApiError> {
    if request.status.is_none() && request.payment_status.is_none() {
        return Err(ApiError::validation("nothing to update"));
    }

    let next_status = match request.status.as_deref() {
        None => current_status,
        Some(raw) => {
            let next = ShipmentStatus::parse(raw)
                .ok_or_else(|| ApiError::validation("unknown shipment status"))?;
            if next != current_status && !current_status.can_transition_to(next) {
                return Err(ApiError::business(format!(
                    "shipment cannot move from {} to {}",
                    current_status.as_str(),
                    next.as_str()
                )));
            }
            next
        }
    };

    let next_payment = match request.payment_status.as_deref() {
        None => current_payment,
        Some(raw) => PaymentStatus::parse(raw)
            .ok_or_else(|| ApiError::validation("payment status must be paid or unpaid"))?,
    };

    Ok((next_status, next_payment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_moves_forward_one_step() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Confirmed));
        assert!(ShipmentStatus::Confirmed.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::Delivered));

        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Delivered));
        assert!(!ShipmentStatus::Confirmed.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::OutForDelivery));
    }

    #[test]
    fn cancel_is_allowed_until_terminal() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Cancelled));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::Cancelled));
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::Cancelled));
        assert!(!ShipmentStatus::Cancelled.can_transition_to(ShipmentStatus::Cancelled));
    }

    fn update(status: Option<&str>, payment_status: Option<&str>) -> UpdateShipmentRequest {
        UpdateShipmentRequest {
            status: status.map(String::from),
            payment_status: payment_status.map(String::from),
        }
    }

    #[test]
    fn marking_a_paid_shipment_paid_again_is_idempotent() {
        let first = resolve_shipment_update(
            ShipmentStatus::Confirmed,
            PaymentStatus::Unpaid,
            &update(None, Some("paid")),
        )
        .unwrap();
        assert_eq!(first, (ShipmentStatus::Confirmed, PaymentStatus::Paid));

        let second = resolve_shipment_update(
            ShipmentStatus::Confirmed,
            PaymentStatus::Paid,
            &update(None, Some("paid")),
        )
        .unwrap();
        assert_eq!(second, (ShipmentStatus::Confirmed, PaymentStatus::Paid));
    }

    #[test]
    fn resending_the_current_status_is_a_noop() {
        let resolved = resolve_shipment_update(
            ShipmentStatus::Delivered,
            PaymentStatus::Paid,
            &update(Some("delivered"), None),
        )
        .unwrap();
        assert_eq!(resolved, (ShipmentStatus::Delivered, PaymentStatus::Paid));
    }

    #[test]
    fn illegal_update_and_empty_update_are_rejected() {
        let skip = resolve_shipment_update(
            ShipmentStatus::Pending,
            PaymentStatus::Unpaid,
            &update(Some("delivered"), None),
        );
        assert!(skip.is_err());

        let empty = resolve_shipment_update(
            ShipmentStatus::Pending,
            PaymentStatus::Unpaid,
            &update(None, None),
        );
        assert!(empty.is_err());

        let garbage = resolve_shipment_update(
            ShipmentStatus::Pending,
            PaymentStatus::Unpaid,
            &update(None, Some("partially")),
        );
        assert!(garbage.is_err());
    }

    #[test]
    fn order_validation() {
        let ok = CreateOrderRequest {
            customer_name: "Noura".into(),
            address: "King Fahd Rd, Riyadh".into(),
            phone: "0550000000".into(),
            total: Decimal::from(120),
        };
        assert!(ok.validate().is_ok());

        let missing_phone = CreateOrderRequest {
            customer_name: "Noura".into(),
            address: "King Fahd Rd".into(),
            phone: "  ".into(),
            total: Decimal::from(120),
        };
        assert!(missing_phone.validate().is_err());
    }
}
