pub mod company;
pub mod ecommerce;
pub mod expense;
pub mod income;
pub mod invoice;
pub mod metadata;
pub mod payroll;
pub mod sub_user;
pub mod voucher;

// Re-export only the types the handlers actually use
pub use company::{
    company_deletable, AssignSubscriptionRequest, Company, CompanyStatus, CreateCompanyRequest,
    TOKEN_VALIDITY_DAYS,
};
pub use ecommerce::{
    resolve_shipment_update, CreateOrderRequest, Order, PaymentStatus, Shipment, ShipmentStatus,
    UpdateShipmentRequest,
};
pub use expense::{Expense, ExpenseFormRows, ExpenseRow};
pub use income::{IncomeForm, IncomeRecord};
pub use invoice::{
    compute_totals, CreateInvoiceRequest, InvoiceAdjustment, InvoiceItem, InvoiceStatus,
    SalesInvoice,
};
pub use metadata::{Account, CostCenter, Employee, PaymentMethodRow};
pub use payroll::{CreatePayrollRequest, PayrollItem, PayrollRun};
pub use sub_user::{
    ActivityLogEntry, CreateSubUserRequest, SubUser, SubUserStatus, UpdateSubUserRequest,
};
pub use voucher::{SaveVoucherRequest, Voucher, VoucherKind};
