pub mod api;
pub mod audit_handlers;
pub mod auth_handlers;
pub mod batch_handlers;
pub mod dashboard;
pub mod financial_request_handlers;
pub mod user_handlers;

use actix_web::{middleware::from_fn, web};

use crate::auth::middleware::{require_auth, require_json_content_type};
use crate::errors::AppError;

/// Mount the JSON API under `/api`.
///
/// Fixed path segments (`/pending/{stage}`) are registered before the
/// `{id}` routes so they are not swallowed by the id matcher.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::Validation(err.to_string()).into()
            }))
            // Public
            .route("/login", web::post().to(auth_handlers::login))
            // Protected
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/logout", web::post().to(auth_handlers::logout))
                    .route("/me", web::get().to(auth_handlers::me))
                    .route("/dashboard", web::get().to(dashboard::index))
                    // Users
                    .route("/users", web::get().to(user_handlers::list))
                    .route("/users", web::post().to(user_handlers::create))
                    // Financial requests
                    .route("/requests", web::get().to(financial_request_handlers::list))
                    .route("/requests", web::post().to(financial_request_handlers::create))
                    .route("/requests/pending/{stage}", web::get().to(financial_request_handlers::pending))
                    .route("/requests/{id}", web::get().to(financial_request_handlers::read))
                    .route("/requests/{id}/log", web::get().to(financial_request_handlers::log))
                    .route("/requests/{id}/budget/approve", web::post().to(financial_request_handlers::approve_budget))
                    .route("/requests/{id}/budget/skip-to-cashier", web::post().to(financial_request_handlers::skip_to_cashier))
                    .route("/requests/{id}/accounting/approve", web::post().to(financial_request_handlers::approve_accounting))
                    .route("/requests/{id}/cashier/pay", web::post().to(financial_request_handlers::pay))
                    .route("/requests/{id}/{stage}/reject", web::post().to(financial_request_handlers::reject))
                    // Batches
                    .route("/batches", web::get().to(batch_handlers::list))
                    .route("/batches", web::post().to(batch_handlers::create))
                    .route("/batches/pending/{stage}", web::get().to(batch_handlers::pending))
                    .route("/batches/{id}", web::get().to(batch_handlers::read))
                    .route("/batches/{id}/log", web::get().to(batch_handlers::log))
                    .route("/batches/{id}/chief/approve", web::post().to(batch_handlers::approve_chief))
                    .route("/batches/{id}/rd/approve", web::post().to(batch_handlers::approve_rd))
                    .route("/batches/{id}/cashier/pay", web::post().to(batch_handlers::pay))
                    .route("/batches/{id}/{stage}/return", web::post().to(batch_handlers::return_batch))
                    // Audit
                    .route("/audit/denied", web::get().to(audit_handlers::denied)),
            ),
    );
}
