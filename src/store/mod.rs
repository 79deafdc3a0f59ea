//! Storage port for the workflow core.
//!
//! The workflow never writes a status blindly: every change goes through a
//! `save_*_transition` call that carries the status the caller read. The
//! adapter applies the new row and appends the log entry only if the stored
//! status still matches, as one atomic unit. `Ok(None)` means the
//! precondition failed and nothing was written.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::batch::{Batch, BatchFilter, BatchStatus, NewBatch};
use crate::models::denied_attempt::{DeniedAttempt, NewDeniedAttempt};
use crate::models::financial_request::{
    FinancialRequest, NewFinancialRequest, RequestFilter, RequestStatus,
};
use crate::models::user::{NewUser, User};
use crate::models::workflow_log::{NewLogEntry, Subject, WorkflowLogEntry};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_request(&self, new: NewFinancialRequest) -> Result<FinancialRequest, AppError>;

    async fn find_request(&self, id: i64) -> Result<Option<FinancialRequest>, AppError>;

    /// Newest first.
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, AppError>;

    /// Longest-waiting first.
    async fn requests_in_status(&self, status: RequestStatus) -> Result<Vec<FinancialRequest>, AppError>;

    async fn save_request_transition(
        &self,
        expected: RequestStatus,
        next: &FinancialRequest,
        log: NewLogEntry,
    ) -> Result<Option<(FinancialRequest, WorkflowLogEntry)>, AppError>;

    async fn create_batch(&self, new: NewBatch) -> Result<Batch, AppError>;

    async fn find_batch(&self, id: i64) -> Result<Option<Batch>, AppError>;

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, AppError>;

    async fn batches_in_status(&self, status: BatchStatus) -> Result<Vec<Batch>, AppError>;

    async fn save_batch_transition(
        &self,
        expected: BatchStatus,
        next: &Batch,
        log: NewLogEntry,
    ) -> Result<Option<(Batch, WorkflowLogEntry)>, AppError>;

    /// Oldest first.
    async fn log_for(&self, subject: Subject) -> Result<Vec<WorkflowLogEntry>, AppError>;

    async fn record_denial(&self, attempt: NewDeniedAttempt) -> Result<DeniedAttempt, AppError>;

    async fn recent_denials(&self, limit: i64) -> Result<Vec<DeniedAttempt>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// `Ok(None)` if the username is taken.
    async fn create_user(&self, new: NewUser) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}
