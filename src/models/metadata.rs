use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Chart-of-accounts entry used by expenses, income, and vouchers.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CostCenter {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PaymentMethodRow {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
}
