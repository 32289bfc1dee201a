use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::utils::money::{round2, vat_amount};

/// Invoice lifecycle. A non-draft invoice is immutable under the tax
/// authority rules: it can advance status but never be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Draft,
    Due,
    Paid,
}

impl InvoiceStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "due" => Some(Self::Due),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Due => "due",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Due) | (Self::Draft, Self::Paid) | (Self::Due, Self::Paid)
        )
    }

    /// Hard delete is only legal for drafts; anything finalized must be
    /// reversed with a credit note.
    pub fn deletable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SalesInvoice {
    pub id: Uuid,
    pub company_id: i64,
    pub number: String,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub pre_tax: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct InvoiceAdjustment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub kind: String,
    pub description: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentKind {
    Discount,
    Addition,
}

impl AdjustmentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discount" => Some(Self::Discount),
            "addition" => Some(Self::Addition),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discount => "discount",
            Self::Addition => "addition",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvoiceItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default = "default_taxable")]
    pub taxable: bool,
}

fn default_taxable() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentInput {
    pub kind: String,
    pub description: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<InvoiceItemInput>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentInput>,
}

pub struct ComputedItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub pre_tax: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

pub struct ComputedAdjustment {
    pub kind: AdjustmentKind,
    pub description: Option<String>,
    pub amount: Decimal,
}

pub struct InvoiceTotals {
    pub items: Vec<ComputedItem>,
    pub adjustments: Vec<ComputedAdjustment>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

/// Recomputes every line and the header totals server-side. Whatever totals
/// the client displayed are ignored.
pub fn compute_totals(
    items: Vec<InvoiceItemInput>,
    adjustments: Vec<AdjustmentInput>,
) -> Result<InvoiceTotals, ApiError> {
    if items.is_empty() {
        return Err(ApiError::validation("an invoice needs at least one item"));
    }

    let mut computed_items = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    for (i, item) in items.into_iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(ApiError::validation(format!(
                "item {}: description is required",
                i + 1
            )));
        }
        if item.quantity <= Decimal::ZERO || item.unit_price < Decimal::ZERO {
            return Err(ApiError::validation(format!(
                "item {}: quantity must be positive and unit price non-negative",
                i + 1
            )));
        }
        let pre_tax = round2(item.quantity * item.unit_price);
        let tax = if item.taxable {
            vat_amount(pre_tax)
        } else {
            Decimal::ZERO
        };
        subtotal += pre_tax;
        tax_total += tax;
        computed_items.push(ComputedItem {
            description: item.description.trim().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            pre_tax,
            tax,
            total: round2(pre_tax + tax),
        });
    }

    let mut adjustment_sum = Decimal::ZERO;
    let mut computed_adjustments = Vec::with_capacity(adjustments.len());
    for (i, adj) in adjustments.into_iter().enumerate() {
        let kind = AdjustmentKind::parse(&adj.kind).ok_or_else(|| {
            ApiError::validation(format!(
                "adjustment {}: kind must be discount or addition",
                i + 1
            ))
        })?;
        if adj.amount <= Decimal::ZERO {
            return Err(ApiError::validation(format!(
                "adjustment {}: amount must be positive",
                i + 1
            )));
        }
        match kind {
            AdjustmentKind::Discount => adjustment_sum -= adj.amount,
            AdjustmentKind::Addition => adjustment_sum += adj.amount,
        }
        computed_adjustments.push(ComputedAdjustment {
            kind,
            description: adj.description,
            amount: adj.amount,
        });
    }

    let total = round2(subtotal + tax_total + adjustment_sum);
    if total < Decimal::ZERO {
        return Err(ApiError::validation(
            "discounts cannot exceed the invoice total",
        ));
    }

    Ok(InvoiceTotals {
        items: computed_items,
        adjustments: computed_adjustments,
        subtotal: round2(subtotal),
        tax_total: round2(tax_total),
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(description: &str, quantity: &str, unit_price: &str, taxable: bool) -> InvoiceItemInput {
        InvoiceItemInput {
            description: description.into(),
            quantity: dec(quantity),
            unit_price: dec(unit_price),
            taxable,
        }
    }

    #[test]
    fn draft_can_advance_but_never_regress() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Due));
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Due.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Due.can_transition_to(InvoiceStatus::Draft));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Due));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Draft));
    }

    #[test]
    fn only_drafts_are_deletable() {
        assert!(InvoiceStatus::Draft.deletable());
        assert!(!InvoiceStatus::Due.deletable());
        assert!(!InvoiceStatus::Paid.deletable());
    }

    #[test]
    fn totals_sum_items_with_vat() {
        let totals = compute_totals(
            vec![item("freight", "2", "100", true), item("insurance", "1", "50", false)],
            vec![],
        )
        .unwrap();
        assert_eq!(totals.subtotal, dec("250.00"));
        assert_eq!(totals.tax_total, dec("30.00"));
        assert_eq!(totals.total, dec("280.00"));
    }

    #[test]
    fn adjustments_move_the_grand_total_only() {
        let totals = compute_totals(
            vec![item("freight", "1", "200", true)],
            vec![
                AdjustmentInput { kind: "discount".into(), description: None, amount: dec("30") },
                AdjustmentInput { kind: "addition".into(), description: None, amount: dec("10") },
            ],
        )
        .unwrap();
        assert_eq!(totals.subtotal, dec("200.00"));
        assert_eq!(totals.tax_total, dec("30.00"));
        assert_eq!(totals.total, dec("210.00"));
    }

    #[test]
    fn empty_invoice_and_bad_adjustment_are_rejected() {
        assert!(compute_totals(vec![], vec![]).is_err());

        let over_discount = compute_totals(
            vec![item("freight", "1", "100", false)],
            vec![AdjustmentInput { kind: "discount".into(), description: None, amount: dec("500") }],
        );
        assert!(over_discount.is_err());

        let bad_kind = compute_totals(
            vec![item("freight", "1", "100", false)],
            vec![AdjustmentInput { kind: "rebate".into(), description: None, amount: dec("5") }],
        );
        assert!(bad_kind.is_err());
    }
}
