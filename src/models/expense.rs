use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::utils::money::{round2, vat_amount};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub company_id: i64,
    pub main_type: String,
    pub expense_date: NaiveDate,
    pub amount: Decimal,
    pub taxable: bool,
    pub net_amount: Decimal,
    pub account_code: String,
    pub cost_center_code: String,
    pub employee_id: Option<Uuid>,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One validated row from the bulk entry form.
#[derive(Debug, PartialEq)]
pub struct ExpenseRow {
    pub main_type: String,
    pub expense_date: NaiveDate,
    pub amount: Decimal,
    pub taxable: bool,
    pub net_amount: Decimal,
    pub account_code: String,
    pub cost_center_code: String,
    pub employee_id: Option<Uuid>,
    pub description: Option<String>,
}

/// `amount` plus 15% VAT when the row is taxable, rounded to 2 decimals.
pub fn net_amount(amount: Decimal, taxable: bool) -> Decimal {
    if taxable {
        round2(amount + vat_amount(amount))
    } else {
        round2(amount)
    }
}

/// Raw parallel arrays as submitted by the multi-row expense form: one
/// repeated multipart field per column, one entry per row.
#[derive(Debug, Default)]
pub struct ExpenseFormRows {
    pub main_type: Vec<String>,
    pub expense_date: Vec<String>,
    pub amount: Vec<String>,
    pub taxable: Vec<String>,
    pub account_code: Vec<String>,
    pub cost_center_code: Vec<String>,
    pub employee_id: Vec<String>,
    pub description: Vec<String>,
}

impl ExpenseFormRows {
    /// Routes one multipart text field into its column. Unknown fields are
    /// ignored.
    pub fn push(&mut self, name: &str, value: String) {
        match name.trim_end_matches("[]") {
            "main_type" => self.main_type.push(value),
            "expense_date" => self.expense_date.push(value),
            "amount" => self.amount.push(value),
            "taxable" => self.taxable.push(value),
            "account_code" => self.account_code.push(value),
            "cost_center_code" => self.cost_center_code.push(value),
            "employee_id" => self.employee_id.push(value),
            "description" => self.description.push(value),
            _ => (),
        }
    }

    /// Validates the arrays and zips them into rows. Rejects ragged arrays
    /// and empty required fields before any SQL runs.
    pub fn into_rows(self) -> Result<Vec<ExpenseRow>, ApiError> {
        let len = self.main_type.len();
        if len == 0 {
            return Err(ApiError::validation("no expense rows submitted"));
        }
        let columns = [
            self.expense_date.len(),
            self.amount.len(),
            self.taxable.len(),
            self.account_code.len(),
            self.cost_center_code.len(),
            self.employee_id.len(),
            self.description.len(),
        ];
        if columns.iter().any(|&c| c != len) {
            return Err(ApiError::validation(
                "expense form fields must have one entry per row",
            ));
        }

        let mut rows = Vec::with_capacity(len);
        for i in 0..len {
            let amount_raw = self.amount[i].trim();
            let date_raw = self.expense_date[i].trim();
            let account_code = self.account_code[i].trim();
            let cost_center_code = self.cost_center_code[i].trim();
            if amount_raw.is_empty()
                || date_raw.is_empty()
                || account_code.is_empty()
                || cost_center_code.is_empty()
            {
                return Err(ApiError::validation(format!(
                    "row {}: amount, expense date, account code and cost center are required",
                    i + 1
                )));
            }

            let amount = Decimal::from_str_radix(amount_raw, 10)
                .map_err(|_| ApiError::validation(format!("row {}: invalid amount", i + 1)))?;
            let expense_date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
                .map_err(|_| ApiError::validation(format!("row {}: invalid expense date", i + 1)))?;
            let taxable = matches!(self.taxable[i].trim(), "true" | "1" | "on");
            let employee_id = {
                let raw = self.employee_id[i].trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(Uuid::parse_str(raw).map_err(|_| {
                        ApiError::validation(format!("row {}: invalid employee id", i + 1))
                    })?)
                }
            };
            let description = {
                let raw = self.description[i].trim();
                (!raw.is_empty()).then(|| raw.to_string())
            };

            rows.push(ExpenseRow {
                main_type: self.main_type[i].trim().to_string(),
                expense_date,
                amount,
                taxable,
                net_amount: net_amount(amount, taxable),
                account_code: account_code.to_string(),
                cost_center_code: cost_center_code.to_string(),
                employee_id,
                description,
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn push_row(
        form: &mut ExpenseFormRows,
        main_type: &str,
        date: &str,
        amount: &str,
        taxable: &str,
    ) {
        form.push("main_type", main_type.into());
        form.push("expense_date", date.into());
        form.push("amount", amount.into());
        form.push("taxable", taxable.into());
        form.push("account_code", "5100".into());
        form.push("cost_center_code", "CC-01".into());
        form.push("employee_id", "".into());
        form.push("description", "".into());
    }

    #[test]
    fn fuel_net_amount_adds_vat_when_taxable() {
        assert_eq!(net_amount(dec("200"), true), dec("230.00"));
        assert_eq!(net_amount(dec("200"), false), dec("200.00"));
        assert_eq!(net_amount(dec("33.33"), true), dec("38.33"));
    }

    #[test]
    fn two_sections_yield_two_tagged_rows() {
        let mut form = ExpenseFormRows::default();
        push_row(&mut form, "fuel", "2026-08-01", "150", "true");
        push_row(&mut form, "iqama", "2026-08-02", "650", "false");

        let rows = form.into_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].main_type, "fuel");
        assert_eq!(rows[0].net_amount, dec("172.50"));
        assert_eq!(rows[1].main_type, "iqama");
        assert_eq!(rows[1].net_amount, dec("650.00"));
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let mut form = ExpenseFormRows::default();
        push_row(&mut form, "fuel", "2026-08-01", "", "true");
        let err = form.into_rows().unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn ragged_arrays_are_rejected() {
        let mut form = ExpenseFormRows::default();
        push_row(&mut form, "fuel", "2026-08-01", "100", "true");
        form.push("amount", "55".into()); // extra amount with no matching row
        assert!(form.into_rows().is_err());
    }

    #[test]
    fn garbage_amount_is_rejected() {
        let mut form = ExpenseFormRows::default();
        push_row(&mut form, "fuel", "2026-08-01", "abc", "true");
        assert!(form.into_rows().is_err());
    }

    #[test]
    fn empty_form_is_rejected() {
        assert!(ExpenseFormRows::default().into_rows().is_err());
    }
}
