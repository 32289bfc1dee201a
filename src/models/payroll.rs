use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::utils::money::round2;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PayrollRun {
    pub id: Uuid,
    pub company_id: i64,
    pub month: String,
    pub package: Option<String>,
    pub is_draft: bool,
    pub total_net: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PayrollItem {
    pub id: Uuid,
    pub payroll_id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub base_salary: Decimal,
    pub allowances: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PayrollItemInput {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub base_salary: Decimal,
    #[serde(default)]
    pub allowances: Decimal,
    #[serde(default)]
    pub deductions: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePayrollRequest {
    pub month: String,
    pub package: Option<String>,
    #[serde(default)]
    pub items: Vec<PayrollItemInput>,
}

pub struct ComputedPayrollItem {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub base_salary: Decimal,
    pub allowances: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
}

pub struct ValidPayroll {
    pub month: String,
    pub package: Option<String>,
    pub items: Vec<ComputedPayrollItem>,
    pub total_net: Decimal,
}

impl CreatePayrollRequest {
    /// Validates the run and computes per-employee and total net amounts.
    pub fn validate(self) -> Result<ValidPayroll, ApiError> {
        if self.month.trim().is_empty() {
            return Err(ApiError::validation("payroll month is required"));
        }
        if self.items.is_empty() {
            return Err(ApiError::validation("a payroll run needs at least one employee"));
        }

        let mut items = Vec::with_capacity(self.items.len());
        let mut total_net = Decimal::ZERO;
        for (i, item) in self.items.into_iter().enumerate() {
            if item.employee_name.trim().is_empty() {
                return Err(ApiError::validation(format!(
                    "payroll item {}: employee name is required",
                    i + 1
                )));
            }
            if item.base_salary < Decimal::ZERO
                || item.allowances < Decimal::ZERO
                || item.deductions < Decimal::ZERO
            {
                return Err(ApiError::validation(format!(
                    "payroll item {}: amounts cannot be negative",
                    i + 1
                )));
            }
            let net = round2(item.base_salary + item.allowances - item.deductions);
            if net < Decimal::ZERO {
                return Err(ApiError::validation(format!(
                    "payroll item {}: deductions exceed gross pay",
                    i + 1
                )));
            }
            total_net += net;
            items.push(ComputedPayrollItem {
                employee_id: item.employee_id,
                employee_name: item.employee_name.trim().to_string(),
                base_salary: item.base_salary,
                allowances: item.allowances,
                deductions: item.deductions,
                net,
            });
        }

        Ok(ValidPayroll {
            month: self.month.trim().to_string(),
            package: self.package,
            items,
            total_net: round2(total_net),
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

    fn item(name: &str, base: &str, allowances: &str, deductions: &str) -> PayrollItemInput {
        PayrollItemInput {
            employee_id: Uuid::new_v4(),
            employee_name: name.into(),
            base_salary: dec(base),
            allowances: dec(allowances),
            deductions: dec(deductions),
        }
    }

    #[test]
    fn nets_are_computed_per_employee_and_totalled() {
        let payroll = CreatePayrollRequest {
            month: "2026-08".into(),
            package: Some("drivers".into()),
            items: vec![item("Ahmed", "4000", "500", "250"), item("Omar", "3500", "0", "0")],
        }
        .validate()
        .unwrap();

        assert_eq!(payroll.items[0].net, dec("4250.00"));
        assert_eq!(payroll.items[1].net, dec("3500.00"));
        assert_eq!(payroll.total_net, dec("7750.00"));
    }

    #[test]
    fn deductions_beyond_gross_are_rejected() {
        let result = CreatePayrollRequest {
            month: "2026-08".into(),
            package: None,
            items: vec![item("Ahmed", "1000", "0", "1500")],
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn empty_month_or_items_are_rejected() {
        assert!(CreatePayrollRequest { month: "  ".into(), package: None, items: vec![item("A", "1", "0", "0")] }
            .validate()
            .is_err());
        assert!(CreatePayrollRequest { month: "2026-08".into(), package: None, items: vec![] }
            .validate()
            .is_err());
    }
}
