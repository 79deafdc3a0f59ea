use chrono::{DateTime, Utc};

use super::{TransitionOutcome, Workflow, required_remarks};
use crate::auth::guard::{Action, Actor};
use crate::auth::validate::validate_amount;
use crate::errors::AppError;
use crate::models::batch::{Batch, BatchForm, BatchStage, BatchStatus, BatchType, NewBatch};
use crate::models::denied_attempt::DenialReason;
use crate::models::workflow_log::{LogAction, NewLogEntry, Subject};

struct Step {
    action: Action,
    expected: BatchStatus,
    log_action: LogAction,
    remarks: Option<String>,
}

impl Workflow {
    /// Queue a NOA or payroll batch for the Chief.
    pub async fn create_batch(&self, actor: &Actor, form: BatchForm) -> Result<Batch, AppError> {
        self.authorize(actor, Action::CreateBatch, None).await?;

        if form.global_academic_period_id <= 0 {
            return Err(AppError::Validation("Academic period is required".to_string()));
        }
        match (form.batch_type, form.total_amount) {
            (BatchType::Noa, Some(_)) => {
                return Err(AppError::Validation(
                    "NOA batches do not carry a total amount".to_string(),
                ));
            }
            (BatchType::Payroll, Some(total)) => {
                if let Some(msg) = validate_amount(total, "Payroll total") {
                    return Err(AppError::Validation(msg));
                }
            }
            _ => {}
        }

        let batch = self
            .store
            .create_batch(NewBatch {
                global_academic_period_id: form.global_academic_period_id,
                program: form.program,
                batch_type: form.batch_type,
                total_amount: form.total_amount,
                created_by: actor.user_id,
                created_at: self.now(),
            })
            .await?;
        log::info!(
            "{} batch #{} for {} created by user {}",
            batch.batch_type.as_str(),
            batch.id,
            batch.program.as_str(),
            actor.user_id
        );
        Ok(batch)
    }

    /// `pending_chief -> pending_rd`
    pub async fn approve_batch_chief(&self, id: i64, actor: &Actor) -> Result<TransitionOutcome<Batch>, AppError> {
        self.authorize(actor, Action::ChiefApprove, Some(Subject::batch(id))).await?;
        let step = Step {
            action: Action::ChiefApprove,
            expected: BatchStatus::PendingChief,
            log_action: LogAction::ChiefApproved,
            remarks: None,
        };
        let approver = actor.user_id;
        self.transition_batch(id, actor, step, move |b, at| {
            b.chief_approver = Some(approver);
            b.chief_approved_at = Some(at);
            b.status = BatchStatus::PendingRd;
        })
        .await
    }

    /// `pending_rd -> approved`
    pub async fn approve_batch_rd(&self, id: i64, actor: &Actor) -> Result<TransitionOutcome<Batch>, AppError> {
        self.authorize(actor, Action::RdApprove, Some(Subject::batch(id))).await?;
        let step = Step {
            action: Action::RdApprove,
            expected: BatchStatus::PendingRd,
            log_action: LogAction::RdApproved,
            remarks: None,
        };
        let approver = actor.user_id;
        self.transition_batch(id, actor, step, move |b, at| {
            b.rd_approver = Some(approver);
            b.rd_approved_at = Some(at);
            b.status = BatchStatus::Approved;
        })
        .await
    }

    /// `approved -> paid`
    pub async fn pay_batch(&self, id: i64, actor: &Actor) -> Result<TransitionOutcome<Batch>, AppError> {
        self.authorize(actor, Action::BatchPay, Some(Subject::batch(id))).await?;
        let step = Step {
            action: Action::BatchPay,
            expected: BatchStatus::Approved,
            log_action: LogAction::Paid,
            remarks: None,
        };
        let processor = actor.user_id;
        self.transition_batch(id, actor, step, move |b, at| {
            b.cashier_processor = Some(processor);
            b.paid_at = Some(at);
            b.status = BatchStatus::Paid;
        })
        .await
    }

    /// Send a batch back from the Chief or RD desk. Approved batches cannot
    /// be returned.
    pub async fn return_batch(
        &self,
        id: i64,
        actor: &Actor,
        stage: BatchStage,
        remarks: Option<&str>,
    ) -> Result<TransitionOutcome<Batch>, AppError> {
        let action = match stage {
            BatchStage::Chief => Action::ChiefReturn,
            BatchStage::Rd => Action::RdReturn,
            BatchStage::Cashier => {
                return Err(AppError::Validation(
                    "Only the Chief or RD stage can return a batch".to_string(),
                ));
            }
        };
        self.authorize(actor, action, Some(Subject::batch(id))).await?;
        let remarks = required_remarks(remarks)?;

        let step = Step {
            action,
            expected: stage.pending_status(),
            log_action: LogAction::Returned,
            remarks: Some(remarks.clone()),
        };
        self.transition_batch(id, actor, step, move |b, _| {
            b.status = BatchStatus::Returned;
            b.remarks = Some(remarks);
        })
        .await
    }

    async fn transition_batch<F>(
        &self,
        id: i64,
        actor: &Actor,
        step: Step,
        apply: F,
    ) -> Result<TransitionOutcome<Batch>, AppError>
    where
        F: FnOnce(&mut Batch, DateTime<Utc>),
    {
        let subject = Subject::batch(id);
        let current = self
            .store
            .find_batch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch #{id}")))?;

        if current.status != step.expected {
            return Err(self.batch_conflict(actor, &step, &current).await);
        }

        let at = self.stamp_after(current.latest_timestamp());
        let mut next = current.clone();
        apply(&mut next, at);
        next.status_changed_at = at;

        let log = NewLogEntry {
            subject,
            actor_id: Some(actor.user_id),
            action: step.log_action,
            from_status: current.status.as_str().to_string(),
            to_status: next.status.as_str().to_string(),
            remarks: step.remarks.clone(),
            created_at: at,
        };

        match self.store.save_batch_transition(step.expected, &next, log).await? {
            Some((saved, entry)) => {
                log::info!(
                    "Batch #{}: {} -> {} ({}) by user {}",
                    saved.id,
                    current.status,
                    saved.status,
                    entry.action,
                    actor.user_id
                );
                let message = format!(
                    "Batch #{} is now {}",
                    saved.id,
                    saved.status.as_str().replace('_', " ")
                );
                Ok(TransitionOutcome { entity: saved, log: entry, message })
            }
            None => {
                let latest = self.store.find_batch(id).await?.unwrap_or(current);
                Err(self.batch_conflict(actor, &step, &latest).await)
            }
        }
    }

    async fn batch_conflict(&self, actor: &Actor, step: &Step, current: &Batch) -> AppError {
        let err = AppError::Conflict(format!(
            "Batch #{} is {}, expected {}",
            current.id, current.status, step.expected
        ));
        self.record_denial(actor, step.action, Some(Subject::batch(current.id)), DenialReason::Conflict, err)
            .await
    }
}
