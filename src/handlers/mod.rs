pub mod companies;
pub mod dashboard;
pub mod ecommerce;
pub mod expenses;
pub mod income;
pub mod invoices;
pub mod payroll;
pub mod sub_users;
pub mod vouchers;
