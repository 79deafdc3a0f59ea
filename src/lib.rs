//! Approval workflow core for scholarship disbursements: financial requests
//! (Budget, Accounting, Cashier) and NOA/payroll batches (Chief, RD, Cashier).

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
pub mod workflow;
