use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::UnknownValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Reimbursement,
    #[serde(rename = "Cash Advance")]
    CashAdvance,
    Liquidation,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Reimbursement => "Reimbursement",
            RequestType::CashAdvance => "Cash Advance",
            RequestType::Liquidation => "Liquidation",
        }
    }
}

impl FromStr for RequestType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reimbursement" => Ok(RequestType::Reimbursement),
            "Cash Advance" => Ok(RequestType::CashAdvance),
            "Liquidation" => Ok(RequestType::Liquidation),
            other => Err(UnknownValue::new("request type", other)),
        }
    }
}

/// Position of a financial request in the approval pipeline.
///
/// The pending states are ordered; `Rejected` is a terminal side exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingBudget,
    PendingAccounting,
    PendingCashier,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::PendingBudget,
        RequestStatus::PendingAccounting,
        RequestStatus::PendingCashier,
        RequestStatus::Completed,
        RequestStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::PendingBudget => "pending_budget",
            RequestStatus::PendingAccounting => "pending_accounting",
            RequestStatus::PendingCashier => "pending_cashier",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Sequence position along the main line; `None` for `Rejected`.
    pub fn rank(self) -> Option<u8> {
        match self {
            RequestStatus::PendingBudget => Some(0),
            RequestStatus::PendingAccounting => Some(1),
            RequestStatus::PendingCashier => Some(2),
            RequestStatus::Completed => Some(3),
            RequestStatus::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    /// The stage currently responsible for the request, if any.
    pub fn stage(self) -> Option<RequestStage> {
        match self {
            RequestStatus::PendingBudget => Some(RequestStage::Budget),
            RequestStatus::PendingAccounting => Some(RequestStage::Accounting),
            RequestStatus::PendingCashier => Some(RequestStage::Cashier),
            RequestStatus::Completed | RequestStatus::Rejected => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownValue::new("request status", s))
    }
}

/// Office that acts on a request while it is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    Budget,
    Accounting,
    Cashier,
}

impl RequestStage {
    pub const ALL: [RequestStage; 3] = [
        RequestStage::Budget,
        RequestStage::Accounting,
        RequestStage::Cashier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStage::Budget => "budget",
            RequestStage::Accounting => "accounting",
            RequestStage::Cashier => "cashier",
        }
    }

    /// Status a request must hold for this stage to act on it.
    pub fn pending_status(self) -> RequestStatus {
        match self {
            RequestStage::Budget => RequestStatus::PendingBudget,
            RequestStage::Accounting => RequestStatus::PendingAccounting,
            RequestStage::Cashier => RequestStatus::PendingCashier,
        }
    }
}

impl FromStr for RequestStage {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStage::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownValue::new("request stage", s))
    }
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialRequest {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub request_type: RequestType,
    pub amount: Decimal,
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub accounting_bypassed: bool,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub budget_approved_at: Option<DateTime<Utc>>,
    pub accounting_approved_at: Option<DateTime<Utc>>,
    pub cashier_paid_at: Option<DateTime<Utc>>,
}

impl FinancialRequest {
    /// Latest timestamp recorded on the request. New transition stamps never
    /// go below this.
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        [
            Some(self.created_at),
            Some(self.status_changed_at),
            self.budget_approved_at,
            self.accounting_approved_at,
            self.cashier_paid_at,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(self.created_at)
    }
}

/// Validated input for a new request.
#[derive(Debug, Clone)]
pub struct NewFinancialRequest {
    pub user_id: i64,
    pub title: String,
    pub request_type: RequestType,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/requests`.
#[derive(Debug, Clone, Deserialize)]
pub struct FinancialRequestForm {
    pub title: String,
    pub request_type: RequestType,
    pub amount: Decimal,
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub user_id: Option<i64>,
}

impl RequestFilter {
    pub fn matches(&self, request: &FinancialRequest) -> bool {
        self.status.is_none_or(|s| s == request.status)
            && self.user_id.is_none_or(|u| u == request.user_id)
    }
}
