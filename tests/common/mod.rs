//! Shared test infrastructure for the workflow and API tests.
//!
//! Everything runs against `MemoryStore` and a clock the test controls, so no
//! database is needed.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use grantflow::auth::guard::Actor;
use grantflow::auth::roles::Role;
use grantflow::errors::AppError;
use grantflow::models::batch::{Batch, BatchFilter, BatchForm, BatchStatus, BatchType, NewBatch, Program};
use grantflow::models::denied_attempt::{DeniedAttempt, NewDeniedAttempt};
use grantflow::models::financial_request::{
    FinancialRequest, FinancialRequestForm, NewFinancialRequest, RequestFilter, RequestStatus, RequestType,
};
use grantflow::models::user::{NewUser, User};
use grantflow::models::workflow_log::{NewLogEntry, Subject, WorkflowLogEntry};
use grantflow::store::{MemoryStore, WorkflowStore};
use grantflow::workflow::Workflow;

// ============================================================================
// CLOCK
// ============================================================================

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).single().expect("valid start time")
}

// ============================================================================
// WORKFLOW SETUP
// ============================================================================

pub struct Harness {
    pub workflow: Workflow,
    pub clock: Arc<MutableClock>,
}

pub fn harness() -> Harness {
    let clock = Arc::new(MutableClock::new(start_time()));
    let workflow = Workflow::new(Arc::new(MemoryStore::new()), clock.clone());
    Harness { workflow, clock }
}

// ============================================================================
// RACING STORE
// ============================================================================

/// `MemoryStore` that yields to the scheduler right before every conditional
/// save. Two transitions joined on one task both read the entity before
/// either writes, so the second save must lose the compare-and-swap.
#[derive(Default)]
pub struct RacingStore {
    inner: MemoryStore,
    save_attempts: AtomicUsize,
}

impl RacingStore {
    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    async fn before_save(&self) {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl WorkflowStore for RacingStore {
    async fn create_request(&self, new: NewFinancialRequest) -> Result<FinancialRequest, AppError> {
        self.inner.create_request(new).await
    }

    async fn find_request(&self, id: i64) -> Result<Option<FinancialRequest>, AppError> {
        self.inner.find_request(id).await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, AppError> {
        self.inner.list_requests(filter).await
    }

    async fn requests_in_status(&self, status: RequestStatus) -> Result<Vec<FinancialRequest>, AppError> {
        self.inner.requests_in_status(status).await
    }

    async fn save_request_transition(
        &self,
        expected: RequestStatus,
        next: &FinancialRequest,
        log: NewLogEntry,
    ) -> Result<Option<(FinancialRequest, WorkflowLogEntry)>, AppError> {
        self.before_save().await;
        self.inner.save_request_transition(expected, next, log).await
    }

    async fn create_batch(&self, new: NewBatch) -> Result<Batch, AppError> {
        self.inner.create_batch(new).await
    }

    async fn find_batch(&self, id: i64) -> Result<Option<Batch>, AppError> {
        self.inner.find_batch(id).await
    }

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, AppError> {
        self.inner.list_batches(filter).await
    }

    async fn batches_in_status(&self, status: BatchStatus) -> Result<Vec<Batch>, AppError> {
        self.inner.batches_in_status(status).await
    }

    async fn save_batch_transition(
        &self,
        expected: BatchStatus,
        next: &Batch,
        log: NewLogEntry,
    ) -> Result<Option<(Batch, WorkflowLogEntry)>, AppError> {
        self.before_save().await;
        self.inner.save_batch_transition(expected, next, log).await
    }

    async fn log_for(&self, subject: Subject) -> Result<Vec<WorkflowLogEntry>, AppError> {
        self.inner.log_for(subject).await
    }

    async fn record_denial(&self, attempt: NewDeniedAttempt) -> Result<DeniedAttempt, AppError> {
        self.inner.record_denial(attempt).await
    }

    async fn recent_denials(&self, limit: i64) -> Result<Vec<DeniedAttempt>, AppError> {
        self.inner.recent_denials(limit).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_username(username).await
    }

    async fn create_user(&self, new: NewUser) -> Result<Option<User>, AppError> {
        self.inner.create_user(new).await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.inner.list_users().await
    }
}

pub fn racing_harness() -> (Harness, Arc<RacingStore>) {
    let clock = Arc::new(MutableClock::new(start_time()));
    let store = Arc::new(RacingStore::default());
    let workflow = Workflow::new(store.clone(), clock.clone());
    (Harness { workflow, clock }, store)
}

// ============================================================================
// ACTORS
// ============================================================================

pub fn admin() -> Actor {
    Actor::new(1, "admin", vec![Role::Admin])
}

pub fn budget() -> Actor {
    Actor::new(2, "budget", vec![Role::Budget])
}

/// A second Budget officer, for concurrent approvals.
pub fn budget_deputy() -> Actor {
    Actor::new(8, "budget_deputy", vec![Role::Budget])
}

pub fn accounting() -> Actor {
    Actor::new(3, "accounting", vec![Role::Accounting])
}

pub fn cashier() -> Actor {
    Actor::new(4, "cashier", vec![Role::Cashier])
}

pub fn chief() -> Actor {
    Actor::new(5, "chief", vec![Role::Chief])
}

pub fn chief_deputy() -> Actor {
    Actor::new(9, "chief_deputy", vec![Role::Chief])
}

pub fn rd() -> Actor {
    Actor::new(6, "rd", vec![Role::RegionalDirector])
}

pub fn staff() -> Actor {
    Actor::new(7, "staff", vec![Role::Staff])
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Amount in centavos, e.g. `pesos(150_000)` is 1,500.00.
pub fn pesos(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn request_form(title: &str, amount: Decimal) -> FinancialRequestForm {
    FinancialRequestForm {
        title: title.to_string(),
        request_type: RequestType::Reimbursement,
        amount,
    }
}

pub async fn submitted_request(workflow: &Workflow) -> FinancialRequest {
    workflow
        .submit_request(&staff(), request_form("Printer toner", pesos(150_000)))
        .await
        .expect("submit request")
}

pub fn payroll_form(total: Decimal) -> BatchForm {
    BatchForm {
        global_academic_period_id: 12,
        program: Program::Tes,
        batch_type: BatchType::Payroll,
        total_amount: Some(total),
    }
}

pub async fn created_batch(workflow: &Workflow) -> Batch {
    workflow
        .create_batch(&admin(), payroll_form(pesos(2_500_000_00)))
        .await
        .expect("create batch")
}
