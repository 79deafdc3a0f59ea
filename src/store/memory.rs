use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::WorkflowStore;
use crate::errors::AppError;
use crate::models::batch::{Batch, BatchFilter, BatchStatus, NewBatch};
use crate::models::denied_attempt::{DeniedAttempt, NewDeniedAttempt};
use crate::models::financial_request::{
    FinancialRequest, NewFinancialRequest, RequestFilter, RequestStatus,
};
use crate::models::user::{NewUser, User};
use crate::models::workflow_log::{NewLogEntry, Subject, WorkflowLogEntry};

#[derive(Default)]
struct State {
    requests: BTreeMap<i64, FinancialRequest>,
    batches: BTreeMap<i64, Batch>,
    logs: Vec<WorkflowLogEntry>,
    denials: Vec<DeniedAttempt>,
    users: Vec<User>,
    next_id: i64,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store used by the test suites. A single
/// mutex makes each conditional save atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn create_request(&self, new: NewFinancialRequest) -> Result<FinancialRequest, AppError> {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        let request = FinancialRequest {
            id,
            user_id: new.user_id,
            title: new.title,
            request_type: new.request_type,
            amount: new.amount,
            status: RequestStatus::PendingBudget,
            remarks: None,
            accounting_bypassed: false,
            created_at: new.created_at,
            status_changed_at: new.created_at,
            budget_approved_at: None,
            accounting_approved_at: None,
            cashier_paid_at: None,
        };
        state.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: i64) -> Result<Option<FinancialRequest>, AppError> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn requests_in_status(&self, status: RequestStatus) -> Result<Vec<FinancialRequest>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state
            .requests
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.status_changed_at.cmp(&b.status_changed_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn save_request_transition(
        &self,
        expected: RequestStatus,
        next: &FinancialRequest,
        log: NewLogEntry,
    ) -> Result<Option<(FinancialRequest, WorkflowLogEntry)>, AppError> {
        let mut state = self.state.lock().await;
        match state.requests.get(&next.id) {
            Some(current) if current.status == expected => {}
            _ => return Ok(None),
        }
        state.requests.insert(next.id, next.clone());
        let entry = log.into_entry(state.allocate_id());
        state.logs.push(entry.clone());
        Ok(Some((next.clone(), entry)))
    }

    async fn create_batch(&self, new: NewBatch) -> Result<Batch, AppError> {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        let batch = Batch {
            id,
            global_academic_period_id: new.global_academic_period_id,
            program: new.program,
            batch_type: new.batch_type,
            status: BatchStatus::PendingChief,
            total_amount: new.total_amount,
            remarks: None,
            created_by: Some(new.created_by),
            chief_approver: None,
            rd_approver: None,
            cashier_processor: None,
            created_at: new.created_at,
            status_changed_at: new.created_at,
            chief_approved_at: None,
            rd_approved_at: None,
            paid_at: None,
        };
        state.batches.insert(id, batch.clone());
        Ok(batch)
    }

    async fn find_batch(&self, id: i64) -> Result<Option<Batch>, AppError> {
        Ok(self.state.lock().await.batches.get(&id).cloned())
    }

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state
            .batches
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn batches_in_status(&self, status: BatchStatus) -> Result<Vec<Batch>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<_> = state
            .batches
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.status_changed_at.cmp(&b.status_changed_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn save_batch_transition(
        &self,
        expected: BatchStatus,
        next: &Batch,
        log: NewLogEntry,
    ) -> Result<Option<(Batch, WorkflowLogEntry)>, AppError> {
        let mut state = self.state.lock().await;
        match state.batches.get(&next.id) {
            Some(current) if current.status == expected => {}
            _ => return Ok(None),
        }
        state.batches.insert(next.id, next.clone());
        let entry = log.into_entry(state.allocate_id());
        state.logs.push(entry.clone());
        Ok(Some((next.clone(), entry)))
    }

    async fn log_for(&self, subject: Subject) -> Result<Vec<WorkflowLogEntry>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .logs
            .iter()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect())
    }

    async fn record_denial(&self, attempt: NewDeniedAttempt) -> Result<DeniedAttempt, AppError> {
        let mut state = self.state.lock().await;
        let denial = attempt.into_attempt(state.allocate_id());
        state.denials.push(denial.clone());
        Ok(denial)
    }

    async fn recent_denials(&self, limit: i64) -> Result<Vec<DeniedAttempt>, AppError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let mut items = state.denials.clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items.truncate(limit);
        Ok(items)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().await;
        let username = new.username.trim().to_string();
        if state.users.iter().any(|u| u.username == username) {
            return Ok(None);
        }
        let user = User {
            id: state.allocate_id(),
            username,
            password_hash: new.password_hash,
            display_name: new.display_name.trim().to_string(),
            roles: new.roles,
        };
        state.users.push(user.clone());
        Ok(Some(user))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.state.lock().await.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
