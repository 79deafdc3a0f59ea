use async_trait::async_trait;
use sqlx::PgPool;

use super::WorkflowStore;
use crate::errors::AppError;
use crate::models::batch::{self, Batch, BatchFilter, BatchStatus, NewBatch};
use crate::models::denied_attempt::{self, DeniedAttempt, NewDeniedAttempt};
use crate::models::financial_request::{
    self, FinancialRequest, NewFinancialRequest, RequestFilter, RequestStatus,
};
use crate::models::user::{self, NewUser, User};
use crate::models::workflow_log::{self, NewLogEntry, Subject, WorkflowLogEntry};

/// PostgreSQL adapter. Transitions run `UPDATE ... WHERE id = $1 AND status = $2`
/// and the log insert in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn create_request(&self, new: NewFinancialRequest) -> Result<FinancialRequest, AppError> {
        Ok(financial_request::create(&self.pool, &new).await?)
    }

    async fn find_request(&self, id: i64) -> Result<Option<FinancialRequest>, AppError> {
        Ok(financial_request::find_by_id(&self.pool, id).await?)
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, AppError> {
        Ok(financial_request::find_filtered(&self.pool, filter).await?)
    }

    async fn requests_in_status(&self, status: RequestStatus) -> Result<Vec<FinancialRequest>, AppError> {
        Ok(financial_request::find_by_status(&self.pool, status).await?)
    }

    async fn save_request_transition(
        &self,
        expected: RequestStatus,
        next: &FinancialRequest,
        log: NewLogEntry,
    ) -> Result<Option<(FinancialRequest, WorkflowLogEntry)>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(saved) = financial_request::update_if_status(&mut tx, expected, next).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let entry = workflow_log::insert(&mut tx, log).await?;
        tx.commit().await?;
        Ok(Some((saved, entry)))
    }

    async fn create_batch(&self, new: NewBatch) -> Result<Batch, AppError> {
        Ok(batch::create(&self.pool, &new).await?)
    }

    async fn find_batch(&self, id: i64) -> Result<Option<Batch>, AppError> {
        Ok(batch::find_by_id(&self.pool, id).await?)
    }

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, AppError> {
        Ok(batch::find_filtered(&self.pool, filter).await?)
    }

    async fn batches_in_status(&self, status: BatchStatus) -> Result<Vec<Batch>, AppError> {
        Ok(batch::find_by_status(&self.pool, status).await?)
    }

    async fn save_batch_transition(
        &self,
        expected: BatchStatus,
        next: &Batch,
        log: NewLogEntry,
    ) -> Result<Option<(Batch, WorkflowLogEntry)>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(saved) = batch::update_if_status(&mut tx, expected, next).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let entry = workflow_log::insert(&mut tx, log).await?;
        tx.commit().await?;
        Ok(Some((saved, entry)))
    }

    async fn log_for(&self, subject: Subject) -> Result<Vec<WorkflowLogEntry>, AppError> {
        Ok(workflow_log::find_for_subject(&self.pool, subject).await?)
    }

    async fn record_denial(&self, attempt: NewDeniedAttempt) -> Result<DeniedAttempt, AppError> {
        Ok(denied_attempt::insert(&self.pool, attempt).await?)
    }

    async fn recent_denials(&self, limit: i64) -> Result<Vec<DeniedAttempt>, AppError> {
        Ok(denied_attempt::find_recent(&self.pool, limit).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(user::find_by_username(&self.pool, username).await?)
    }

    async fn create_user(&self, new: NewUser) -> Result<Option<User>, AppError> {
        Ok(user::create(&self.pool, &new).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(user::find_all(&self.pool).await?)
    }
}
