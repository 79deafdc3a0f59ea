//! Static authorization map for workflow actions.
//!
//! Each workflow operation names an [`Action`]; the action maps to the fixed
//! set of roles allowed to perform it. The check happens before any entity is
//! read, so a forbidden call never touches storage.

use serde::Serialize;
use std::fmt;

use super::roles::{Role, Roles};
use crate::errors::AppError;

/// The authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: i64,
    pub username: String,
    pub roles: Roles,
}

impl Actor {
    pub fn new(user_id: i64, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Actor {
            user_id,
            username: username.into(),
            roles: Roles(roles),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SubmitRequest,
    BudgetApprove,
    BudgetReject,
    SkipAccounting,
    AccountingApprove,
    AccountingReject,
    CashierPay,
    CashierReject,
    CreateBatch,
    ChiefApprove,
    ChiefReturn,
    RdApprove,
    RdReturn,
    BatchPay,
    ManageUsers,
    ViewDenials,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::SubmitRequest => "submit_request",
            Action::BudgetApprove => "budget_approve",
            Action::BudgetReject => "budget_reject",
            Action::SkipAccounting => "skip_accounting",
            Action::AccountingApprove => "accounting_approve",
            Action::AccountingReject => "accounting_reject",
            Action::CashierPay => "cashier_pay",
            Action::CashierReject => "cashier_reject",
            Action::CreateBatch => "create_batch",
            Action::ChiefApprove => "chief_approve",
            Action::ChiefReturn => "chief_return",
            Action::RdApprove => "rd_approve",
            Action::RdReturn => "rd_return",
            Action::BatchPay => "batch_pay",
            Action::ManageUsers => "manage_users",
            Action::ViewDenials => "view_denials",
        }
    }

    /// Roles permitted to perform this action.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::SubmitRequest => &Role::ALL,
            Action::BudgetApprove | Action::BudgetReject => &[Role::Budget],
            // Administrative override: not part of the regular budget role.
            Action::SkipAccounting => &[Role::Admin],
            Action::AccountingApprove | Action::AccountingReject => &[Role::Accounting],
            Action::CashierPay | Action::CashierReject | Action::BatchPay => &[Role::Cashier],
            Action::CreateBatch => &[Role::Admin],
            Action::ChiefApprove | Action::ChiefReturn => &[Role::Chief],
            Action::RdApprove | Action::RdReturn => &[Role::RegionalDirector],
            Action::ManageUsers | Action::ViewDenials => &[Role::Admin],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the actor against the static map; returns `PermissionDenied` if
/// none of their roles is allowed.
pub fn authorize(actor: &Actor, action: Action) -> Result<(), AppError> {
    if actor.roles.has_any(action.allowed_roles()) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(action.as_str().to_string()))
    }
}
