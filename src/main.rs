mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod numbering;
mod response;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use dotenvy::dotenv;
use std::env;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use database::{create_database_pool, Database};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Initialize database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = create_database_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    log::info!("database connection successful");

    // Build the application router
    let app = create_router(db);

    // Get port from environment or use default
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    log::info!("ledgerdesk server starting on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn create_router(db: Database) -> Router {
    Router::new()
        // Dashboard
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        // Expenses
        .route("/api/expenses", get(handlers::expenses::list))
        .route("/api/expenses/metadata", get(handlers::expenses::metadata))
        .route("/api/expenses/save", post(handlers::expenses::save))
        // Income
        .route("/api/income", get(handlers::income::list))
        .route("/api/income/metadata", get(handlers::income::metadata))
        .route("/api/income/save", post(handlers::income::save))
        .route("/api/income/:id", delete(handlers::income::delete))
        // Payment / receipt vouchers
        .route("/api/vouchers", get(handlers::vouchers::list))
        .route("/api/vouchers/metadata", get(handlers::vouchers::metadata))
        .route("/api/vouchers/save", post(handlers::vouchers::save))
        .route("/api/vouchers/:id", delete(handlers::vouchers::delete))
        // Sales invoices
        .route("/api/sales-invoices", get(handlers::invoices::list))
        .route("/api/sales-invoices", post(handlers::invoices::create))
        .route("/api/sales-invoices/:id", get(handlers::invoices::get))
        .route("/api/sales-invoices/:id", patch(handlers::invoices::update_status))
        .route("/api/sales-invoices/:id", delete(handlers::invoices::delete))
        // Payroll
        .route("/api/payroll", get(handlers::payroll::list))
        .route("/api/payroll", post(handlers::payroll::create))
        .route("/api/payroll/:id", get(handlers::payroll::get))
        .route("/api/payroll/:id", delete(handlers::payroll::delete))
        .route("/api/payroll/:id/finalize", patch(handlers::payroll::finalize))
        // Company onboarding (admin)
        .route("/api/admin/companies", get(handlers::companies::list))
        .route("/api/admin/companies/create", post(handlers::companies::create))
        .route("/api/admin/companies/:id", delete(handlers::companies::delete))
        .route("/api/admin/companies/:id/approve", patch(handlers::companies::approve))
        .route("/api/admin/companies/:id/reject", patch(handlers::companies::reject))
        .route("/api/admin/companies/:id/activate", patch(handlers::companies::activate))
        .route("/api/admin/companies/:id/deactivate", patch(handlers::companies::deactivate))
        .route("/api/admin/companies/:id/token", post(handlers::companies::generate_token))
        .route("/api/admin/subscriptions/assign", post(handlers::companies::assign_subscription))
        // Sub-users
        .route("/api/sub-users", get(handlers::sub_users::list))
        .route("/api/sub-users", post(handlers::sub_users::create))
        .route("/api/sub-users/:id", put(handlers::sub_users::update))
        .route("/api/sub-users/:id", delete(handlers::sub_users::delete))
        .route("/api/sub-users/:id/activity", get(handlers::sub_users::activity))
        // E-commerce
        .route("/api/ecommerce/orders", get(handlers::ecommerce::list_orders))
        .route("/api/ecommerce/orders", post(handlers::ecommerce::create_order))
        .route("/api/ecommerce/shipments", get(handlers::ecommerce::list_shipments))
        .route("/api/ecommerce/shipments/:id", patch(handlers::ecommerce::update_shipment))
        .route("/api/ecommerce/shipments/:id", delete(handlers::ecommerce::delete_shipment))
        // Uploaded attachments
        .nest_service("/static", ServeDir::new("static"))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)), // 10MB
        )
        .with_state(db)
}
