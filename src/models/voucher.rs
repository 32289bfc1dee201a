use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::numbering::DocumentKind;
use crate::utils::money::{round2, tax_at_rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherKind {
    Payment,
    Receipt,
}

impl VoucherKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment" => Some(Self::Payment),
            "receipt" => Some(Self::Receipt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Receipt => "receipt",
        }
    }

    pub fn document_kind(&self) -> DocumentKind {
        match self {
            Self::Payment => DocumentKind::PaymentVoucher,
            Self::Receipt => DocumentKind::ReceiptVoucher,
        }
    }

    /// A voucher keeps its kind for life; an edit that tries to switch
    /// series is rejected rather than reported as a missing voucher.
    pub fn require_same(&self, existing: &str) -> Result<(), ApiError> {
        if existing == self.as_str() {
            Ok(())
        } else {
            Err(ApiError::business(format!(
                "voucher is a {} voucher and cannot change kind",
                existing
            )))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Voucher {
    pub id: Uuid,
    pub company_id: i64,
    pub kind: String,
    pub number: String,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_value: Decimal,
    pub total: Decimal,
    pub payee: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// Save request shared by create and edit; `id` present means edit.
#[derive(Debug, Deserialize)]
pub struct SaveVoucherRequest {
    pub id: Option<Uuid>,
    pub kind: String,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    pub payee: String,
    pub payment_method: String,
}

pub struct ValidVoucher {
    pub id: Option<Uuid>,
    pub kind: VoucherKind,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_value: Decimal,
    pub total: Decimal,
    pub payee: String,
    pub payment_method: String,
}

impl SaveVoucherRequest {
    pub fn validate(self) -> Result<ValidVoucher, ApiError> {
        let kind = VoucherKind::parse(&self.kind)
            .ok_or_else(|| ApiError::validation("kind must be payment or receipt"))?;
        if self.debit_account.trim().is_empty()
            || self.credit_account.trim().is_empty()
            || self.payee.trim().is_empty()
            || self.payment_method.trim().is_empty()
        {
            return Err(ApiError::validation(
                "debit account, credit account, payee and payment method are required",
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ApiError::validation("amount must be positive"));
        }
        if self.tax_rate < Decimal::ZERO {
            return Err(ApiError::validation("tax rate cannot be negative"));
        }

        let tax_value = tax_at_rate(self.amount, self.tax_rate);
        let total = round2(self.amount + tax_value);
        Ok(ValidVoucher {
            id: self.id,
            kind,
            debit_account: self.debit_account.trim().to_string(),
            credit_account: self.credit_account.trim().to_string(),
            amount: self.amount,
            tax_rate: self.tax_rate,
            tax_value,
            total,
            payee: self.payee.trim().to_string(),
            payment_method: self.payment_method.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn request(amount: &str, tax_rate: &str) -> SaveVoucherRequest {
        SaveVoucherRequest {
            id: None,
            kind: "payment".into(),
            debit_account: "5100".into(),
            credit_account: "1010".into(),
            amount: dec(amount),
            tax_rate: dec(tax_rate),
            payee: "Al Amal Trading".into(),
            payment_method: "bank_transfer".into(),
        }
    }

    #[test]
    fn tax_and_total_are_computed_from_rate() {
        let voucher = request("400", "15").validate().unwrap();
        assert_eq!(voucher.tax_value, dec("60.00"));
        assert_eq!(voucher.total, dec("460.00"));
    }

    #[test]
    fn zero_rate_means_no_tax() {
        let voucher = request("400", "0").validate().unwrap();
        assert_eq!(voucher.tax_value, Decimal::ZERO);
        assert_eq!(voucher.total, dec("400.00"));
    }

    #[test]
    fn rejects_unknown_kind_and_bad_amount() {
        let mut bad_kind = request("100", "15");
        bad_kind.kind = "transfer".into();
        assert!(bad_kind.validate().is_err());

        assert!(request("0", "15").validate().is_err());
        assert!(request("-5", "15").validate().is_err());
    }

    #[test]
    fn an_edit_cannot_switch_voucher_kind() {
        assert!(VoucherKind::Payment.require_same("payment").is_ok());
        let err = VoucherKind::Payment.require_same("receipt").unwrap_err();
        assert!(err.to_string().contains("cannot change kind"));
    }

    #[test]
    fn kind_maps_to_its_document_series() {
        assert_eq!(
            VoucherKind::Payment.document_kind().format_number(3),
            "PV-000003"
        );
        assert_eq!(
            VoucherKind::Receipt.document_kind().format_number(3),
            "RV-000003"
        );
    }
}
