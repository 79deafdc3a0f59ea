use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::UnknownValue;

/// Which workflow entity a log row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    FinancialRequest,
    Batch,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::FinancialRequest => "financial_request",
            SubjectKind::Batch => "batch",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "financial_request" => Ok(SubjectKind::FinancialRequest),
            "batch" => Ok(SubjectKind::Batch),
            other => Err(UnknownValue::new("subject kind", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: i64,
}

impl Subject {
    pub fn request(id: i64) -> Self {
        Subject { kind: SubjectKind::FinancialRequest, id }
    }

    pub fn batch(id: i64) -> Self {
        Subject { kind: SubjectKind::Batch, id }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind.as_str(), self.id)
    }
}

/// Name of a completed transition, as written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    BudgetApproved,
    AccountingApproved,
    CashierPaid,
    Rejected,
    SkippedAccounting,
    ChiefApproved,
    RdApproved,
    Paid,
    Returned,
}

impl LogAction {
    pub const ALL: [LogAction; 9] = [
        LogAction::BudgetApproved,
        LogAction::AccountingApproved,
        LogAction::CashierPaid,
        LogAction::Rejected,
        LogAction::SkippedAccounting,
        LogAction::ChiefApproved,
        LogAction::RdApproved,
        LogAction::Paid,
        LogAction::Returned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogAction::BudgetApproved => "budget_approved",
            LogAction::AccountingApproved => "accounting_approved",
            LogAction::CashierPaid => "cashier_paid",
            LogAction::Rejected => "rejected",
            LogAction::SkippedAccounting => "skipped_accounting",
            LogAction::ChiefApproved => "chief_approved",
            LogAction::RdApproved => "rd_approved",
            LogAction::Paid => "paid",
            LogAction::Returned => "returned",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogAction {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownValue::new("log action", s))
    }
}

/// One append-only row of the transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowLogEntry {
    pub id: i64,
    pub subject: Subject,
    /// `None` for system-initiated transitions.
    pub actor_id: Option<i64>,
    pub action: LogAction,
    pub from_status: String,
    pub to_status: String,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub subject: Subject,
    pub actor_id: Option<i64>,
    pub action: LogAction,
    pub from_status: String,
    pub to_status: String,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLogEntry {
    pub fn into_entry(self, id: i64) -> WorkflowLogEntry {
        WorkflowLogEntry {
            id,
            subject: self.subject,
            actor_id: self.actor_id,
            action: self.action,
            from_status: self.from_status,
            to_status: self.to_status,
            remarks: self.remarks,
            created_at: self.created_at,
        }
    }
}
