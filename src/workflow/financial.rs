use chrono::{DateTime, Utc};

use super::{TransitionOutcome, Workflow, required_remarks};
use crate::auth::guard::{Action, Actor};
use crate::auth::validate::{validate_amount, validate_required};
use crate::errors::AppError;
use crate::models::denied_attempt::DenialReason;
use crate::models::financial_request::{
    FinancialRequest, FinancialRequestForm, NewFinancialRequest, RequestStage, RequestStatus,
};
use crate::models::workflow_log::{LogAction, NewLogEntry, Subject};

/// Everything a single request transition needs besides the mutation itself.
struct Step {
    action: Action,
    expected: RequestStatus,
    log_action: LogAction,
    remarks: Option<String>,
}

impl Workflow {
    /// Create a request at `pending_budget` on behalf of the actor.
    pub async fn submit_request(
        &self,
        actor: &Actor,
        form: FinancialRequestForm,
    ) -> Result<FinancialRequest, AppError> {
        self.authorize(actor, Action::SubmitRequest, None).await?;

        if let Some(msg) = validate_required(&form.title, "Title", 255) {
            return Err(AppError::Validation(msg));
        }
        if let Some(msg) = validate_amount(form.amount, "Amount") {
            return Err(AppError::Validation(msg));
        }

        let request = self
            .store
            .create_request(NewFinancialRequest {
                user_id: actor.user_id,
                title: form.title.trim().to_string(),
                request_type: form.request_type,
                amount: form.amount,
                created_at: self.now(),
            })
            .await?;
        log::info!(
            "Financial request #{} ({}, {}) submitted by user {}",
            request.id,
            request.request_type.as_str(),
            request.amount,
            actor.user_id
        );
        Ok(request)
    }

    /// Budget sign-off: `pending_budget -> pending_accounting`.
    pub async fn approve_budget(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError> {
        self.authorize(actor, Action::BudgetApprove, Some(Subject::request(id))).await?;
        let step = Step {
            action: Action::BudgetApprove,
            expected: RequestStatus::PendingBudget,
            log_action: LogAction::BudgetApproved,
            remarks: None,
        };
        self.transition_request(id, actor, step, |r, at| {
            r.budget_approved_at = Some(at);
            r.status = RequestStatus::PendingAccounting;
        })
        .await
    }

    /// Accounting sign-off: `pending_accounting -> pending_cashier`.
    pub async fn approve_accounting(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError> {
        self.authorize(actor, Action::AccountingApprove, Some(Subject::request(id))).await?;
        let step = Step {
            action: Action::AccountingApprove,
            expected: RequestStatus::PendingAccounting,
            log_action: LogAction::AccountingApproved,
            remarks: None,
        };
        self.transition_request(id, actor, step, |r, at| {
            r.accounting_approved_at = Some(at);
            r.status = RequestStatus::PendingCashier;
        })
        .await
    }

    /// Cashier releases the funds: `pending_cashier -> completed`.
    pub async fn pay_request(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError> {
        self.authorize(actor, Action::CashierPay, Some(Subject::request(id))).await?;
        let step = Step {
            action: Action::CashierPay,
            expected: RequestStatus::PendingCashier,
            log_action: LogAction::CashierPaid,
            remarks: None,
        };
        self.transition_request(id, actor, step, |r, at| {
            r.cashier_paid_at = Some(at);
            r.status = RequestStatus::Completed;
        })
        .await
    }

    /// Reject a request that is waiting on `stage`. Remarks are mandatory and
    /// stored exactly as given.
    pub async fn reject_request(
        &self,
        id: i64,
        actor: &Actor,
        stage: RequestStage,
        remarks: Option<&str>,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError> {
        let action = match stage {
            RequestStage::Budget => Action::BudgetReject,
            RequestStage::Accounting => Action::AccountingReject,
            RequestStage::Cashier => Action::CashierReject,
        };
        self.authorize(actor, action, Some(Subject::request(id))).await?;
        let remarks = required_remarks(remarks)?;

        let step = Step {
            action,
            expected: stage.pending_status(),
            log_action: LogAction::Rejected,
            remarks: Some(remarks.clone()),
        };
        self.transition_request(id, actor, step, move |r, _| {
            r.status = RequestStatus::Rejected;
            r.remarks = Some(remarks);
        })
        .await
    }

    /// Administrative override: `pending_budget -> pending_cashier`, marking
    /// the accounting stage as bypassed. Needs the override role and remarks;
    /// the remarks go to the log entry only.
    pub async fn skip_to_cashier(
        &self,
        id: i64,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError> {
        self.authorize(actor, Action::SkipAccounting, Some(Subject::request(id))).await?;
        let remarks = required_remarks(remarks)?;

        let step = Step {
            action: Action::SkipAccounting,
            expected: RequestStatus::PendingBudget,
            log_action: LogAction::SkippedAccounting,
            remarks: Some(remarks),
        };
        self.transition_request(id, actor, step, |r, at| {
            r.budget_approved_at = Some(at);
            r.accounting_bypassed = true;
            r.status = RequestStatus::PendingCashier;
        })
        .await
    }

    /// Load, check the stage precondition, apply and conditionally save.
    /// Callers have already authorized the actor and validated input.
    async fn transition_request<F>(
        &self,
        id: i64,
        actor: &Actor,
        step: Step,
        apply: F,
    ) -> Result<TransitionOutcome<FinancialRequest>, AppError>
    where
        F: FnOnce(&mut FinancialRequest, DateTime<Utc>),
    {
        let subject = Subject::request(id);
        let current = self
            .store
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Financial request #{id}")))?;

        if current.status != step.expected {
            return Err(self.request_conflict(actor, &step, &current).await);
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

        match self.store.save_request_transition(step.expected, &next, log).await? {
            Some((saved, entry)) => {
                log::info!(
                    "Financial request #{}: {} -> {} ({}) by user {}",
                    saved.id,
                    current.status,
                    saved.status,
                    entry.action,
                    actor.user_id
                );
                let message = format!(
                    "Financial request #{} is now {}",
                    saved.id,
                    saved.status.as_str().replace('_', " ")
                );
                Ok(TransitionOutcome { entity: saved, log: entry, message })
            }
            None => {
                // Lost the race: someone moved the request after we read it.
                let latest = self.store.find_request(id).await?.unwrap_or(current);
                Err(self.request_conflict(actor, &step, &latest).await)
            }
        }
    }

    async fn request_conflict(&self, actor: &Actor, step: &Step, current: &FinancialRequest) -> AppError {
        let err = AppError::Conflict(format!(
            "Financial request #{} is {}, expected {}",
            current.id, current.status, step.expected
        ));
        self.record_denial(actor, step.action, Some(Subject::request(current.id)), DenialReason::Conflict, err)
            .await
    }
}
