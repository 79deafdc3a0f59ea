use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::Workflow;
use crate::auth::guard::{Action, Actor};
use crate::errors::AppError;
use crate::models::batch::{Batch, BatchFilter, BatchStage};
use crate::models::denied_attempt::DeniedAttempt;
use crate::models::financial_request::{FinancialRequest, RequestFilter, RequestStage};
use crate::models::workflow_log::{Subject, WorkflowLogEntry};

/// Pending work for one stage, as shown on the management dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub pipeline: &'static str,
    pub stage: &'static str,
    pub pending: usize,
    /// Seconds the longest-waiting item has been in this stage.
    pub longest_wait_secs: Option<i64>,
}

impl Workflow {
    pub async fn find_request(&self, id: i64) -> Result<FinancialRequest, AppError> {
        self.store
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Financial request #{id}")))
    }

    pub async fn find_batch(&self, id: i64) -> Result<Batch, AppError> {
        self.store
            .find_batch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch #{id}")))
    }

    pub async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, AppError> {
        self.store.list_requests(filter).await
    }

    pub async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, AppError> {
        self.store.list_batches(filter).await
    }

    /// Requests waiting on `stage`, longest-waiting first.
    pub async fn list_pending_requests(&self, stage: RequestStage) -> Result<Vec<FinancialRequest>, AppError> {
        self.store.requests_in_status(stage.pending_status()).await
    }

    /// Batches waiting on `stage`, longest-waiting first.
    pub async fn list_pending_batches(&self, stage: BatchStage) -> Result<Vec<Batch>, AppError> {
        self.store.batches_in_status(stage.pending_status()).await
    }

    /// Transition history of a request, oldest first.
    pub async fn request_log(&self, id: i64) -> Result<Vec<WorkflowLogEntry>, AppError> {
        self.find_request(id).await?;
        self.store.log_for(Subject::request(id)).await
    }

    pub async fn batch_log(&self, id: i64) -> Result<Vec<WorkflowLogEntry>, AppError> {
        self.find_batch(id).await?;
        self.store.log_for(Subject::batch(id)).await
    }

    /// Wall-clock time since the entity entered its current status. Never
    /// negative.
    pub fn time_in_stage(&self, entered_at: DateTime<Utc>) -> TimeDelta {
        (self.now() - entered_at).max(TimeDelta::zero())
    }

    pub fn request_time_in_stage(&self, request: &FinancialRequest) -> TimeDelta {
        self.time_in_stage(request.status_changed_at)
    }

    pub fn batch_time_in_stage(&self, batch: &Batch) -> TimeDelta {
        self.time_in_stage(batch.status_changed_at)
    }

    /// Pending counts and longest wait for every stage of both pipelines.
    pub async fn stage_summaries(&self) -> Result<Vec<StageSummary>, AppError> {
        let mut summaries = Vec::new();
        for stage in RequestStage::ALL {
            let pending = self.list_pending_requests(stage).await?;
            summaries.push(StageSummary {
                pipeline: "financial_request",
                stage: stage.as_str(),
                pending: pending.len(),
                longest_wait_secs: pending
                    .first()
                    .map(|r| self.request_time_in_stage(r).num_seconds()),
            });
        }
        for stage in BatchStage::ALL {
            let pending = self.list_pending_batches(stage).await?;
            summaries.push(StageSummary {
                pipeline: "batch",
                stage: stage.as_str(),
                pending: pending.len(),
                longest_wait_secs: pending
                    .first()
                    .map(|b| self.batch_time_in_stage(b).num_seconds()),
            });
        }
        Ok(summaries)
    }

    /// Recent refused calls, for administrators.
    pub async fn recent_denials(&self, actor: &Actor, limit: i64) -> Result<Vec<DeniedAttempt>, AppError> {
        self.authorize(actor, Action::ViewDenials, None).await?;
        self.store.recent_denials(limit.clamp(1, 500)).await
    }
}
