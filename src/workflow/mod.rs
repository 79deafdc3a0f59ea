//! Approval pipelines for financial requests and disbursement batches.
//!
//! Every transition follows the same order:
//! 1. role check against the static action map (`auth::guard`);
//! 2. input validation (remarks, amounts);
//! 3. load the entity and compare its status with the stage precondition;
//! 4. conditional save of the new row plus one log entry.
//!
//! Role and precondition failures are written to the denied-attempt log and
//! returned unchanged to the caller. Nothing is retried.

pub mod batch;
pub mod financial;
pub mod queries;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::guard::{self, Action, Actor};
use crate::errors::AppError;
use crate::models::denied_attempt::{DenialReason, NewDeniedAttempt};
use crate::models::workflow_log::{Subject, WorkflowLogEntry};
use crate::store::WorkflowStore;

/// Result of one successful transition, handed to the presentation layer
/// in place of a flashed session message.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome<T> {
    pub entity: T,
    pub log: WorkflowLogEntry,
    pub message: String,
}

#[derive(Clone)]
pub struct Workflow {
    store: Arc<dyn WorkflowStore>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Workflow {
    pub fn new(store: Arc<dyn WorkflowStore>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Workflow { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Current time, but never earlier than `floor`. Keeps stage timestamps
    /// non-decreasing even if the wall clock steps backwards.
    fn stamp_after(&self, floor: DateTime<Utc>) -> DateTime<Utc> {
        self.now().max(floor)
    }

    /// Role check; a refusal is recorded before the error is returned.
    pub(crate) async fn authorize(&self, actor: &Actor, action: Action, subject: Option<Subject>) -> Result<(), AppError> {
        match guard::authorize(actor, action) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.record_denial(actor, action, subject, DenialReason::Forbidden, err).await),
        }
    }

    /// Write a denied attempt and hand back the original error. A failure to
    /// record is logged and otherwise ignored so the caller still sees the
    /// real cause.
    async fn record_denial(
        &self,
        actor: &Actor,
        action: Action,
        subject: Option<Subject>,
        reason: DenialReason,
        err: AppError,
    ) -> AppError {
        let target = subject.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        log::warn!(
            "Denied {} by user {} on {}: {}",
            action,
            actor.user_id,
            target,
            err
        );
        let attempt = NewDeniedAttempt {
            actor_id: actor.user_id,
            action: action.as_str().to_string(),
            subject,
            reason,
            detail: err.to_string(),
            created_at: self.now(),
        };
        if let Err(e) = self.store.record_denial(attempt).await {
            log::error!("Failed to record denied attempt: {e}");
        }
        err
    }
}

/// Validated remarks, kept verbatim.
fn required_remarks(remarks: Option<&str>) -> Result<String, AppError> {
    match crate::auth::validate::validate_remarks(remarks) {
        Some(msg) => Err(AppError::Validation(msg)),
        None => Ok(remarks.unwrap_or_default().to_string()),
    }
}
