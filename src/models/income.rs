use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::utils::money::{round2, vat_amount};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct IncomeRecord {
    pub id: Uuid,
    pub company_id: i64,
    pub amount: Decimal,
    pub vat_enabled: bool,
    pub vat: Decimal,
    pub total: Decimal,
    pub account_code: String,
    pub cost_center_code: String,
    pub payment_method: String,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `(vat, total)` for an income amount. VAT is 15% when enabled, zero
/// otherwise; both rounded to 2 decimals.
pub fn income_totals(amount: Decimal, vat_enabled: bool) -> (Decimal, Decimal) {
    let vat = if vat_enabled {
        vat_amount(amount)
    } else {
        Decimal::ZERO
    };
    (vat, round2(amount + vat))
}

/// Raw text fields from the income multipart form.
#[derive(Debug, Default)]
pub struct IncomeForm {
    pub amount: String,
    pub vat_enabled: String,
    pub account_code: String,
    pub cost_center_code: String,
    pub payment_method: String,
    pub description: String,
}

pub struct ValidIncome {
    pub amount: Decimal,
    pub vat_enabled: bool,
    pub vat: Decimal,
    pub total: Decimal,
    pub account_code: String,
    pub cost_center_code: String,
    pub payment_method: String,
    pub description: Option<String>,
}

impl IncomeForm {
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "amount" => self.amount = value,
            "vat_enabled" => self.vat_enabled = value,
            "account_code" => self.account_code = value,
            "cost_center_code" => self.cost_center_code = value,
            "payment_method" => self.payment_method = value,
            "description" => self.description = value,
            _ => (),
        }
    }

    pub fn validate(self) -> Result<ValidIncome, ApiError> {
        let amount_raw = self.amount.trim();
        if amount_raw.is_empty()
            || self.account_code.trim().is_empty()
            || self.cost_center_code.trim().is_empty()
            || self.payment_method.trim().is_empty()
        {
            return Err(ApiError::validation(
                "amount, account code, cost center and payment method are required",
            ));
        }
        let amount = Decimal::from_str_radix(amount_raw, 10)
            .map_err(|_| ApiError::validation("invalid amount"))?;
        let vat_enabled = matches!(self.vat_enabled.trim(), "true" | "1" | "on");
        let (vat, total) = income_totals(amount, vat_enabled);
        let description = {
            let raw = self.description.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        };

        Ok(ValidIncome {
            amount,
            vat_enabled,
            vat,
            total,
            account_code: self.account_code.trim().to_string(),
            cost_center_code: self.cost_center_code.trim().to_string(),
            payment_method: self.payment_method.trim().to_string(),
            description,
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

    #[test]
    fn totals_with_vat() {
        let (vat, total) = income_totals(dec("1000"), true);
        assert_eq!(vat, dec("150.00"));
        assert_eq!(total, dec("1150.00"));
    }

    #[test]
    fn totals_without_vat() {
        let (vat, total) = income_totals(dec("1000"), false);
        assert_eq!(vat, Decimal::ZERO);
        assert_eq!(total, dec("1000.00"));
    }

    #[test]
    fn validate_computes_server_side_totals() {
        let mut form = IncomeForm::default();
        form.set("amount", "820.50".into());
        form.set("vat_enabled", "on".into());
        form.set("account_code", "4000".into());
        form.set("cost_center_code", "CC-02".into());
        form.set("payment_method", "bank_transfer".into());

        let income = form.validate().unwrap();
        assert_eq!(income.vat, dec("123.08"));
        assert_eq!(income.total, dec("943.58"));
    }

    #[test]
    fn missing_amount_is_rejected() {
        let mut form = IncomeForm::default();
        form.set("account_code", "4000".into());
        form.set("cost_center_code", "CC-02".into());
        form.set("payment_method", "cash".into());
        assert!(form.validate().is_err());
    }
}
