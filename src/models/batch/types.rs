use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::UnknownValue;

/// Scholarship programs whose awards are batched for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    #[serde(rename = "TDP")]
    Tdp,
    #[serde(rename = "TES")]
    Tes,
    #[serde(rename = "CMSP")]
    Cmsp,
    #[serde(rename = "MSRS")]
    Msrs,
    #[serde(rename = "StuFAPs")]
    StuFaps,
    #[serde(rename = "CoSCho")]
    CoScho,
    Estatskolar,
}

impl Program {
    pub const ALL: [Program; 7] = [
        Program::Tdp,
        Program::Tes,
        Program::Cmsp,
        Program::Msrs,
        Program::StuFaps,
        Program::CoScho,
        Program::Estatskolar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Program::Tdp => "TDP",
            Program::Tes => "TES",
            Program::Cmsp => "CMSP",
            Program::Msrs => "MSRS",
            Program::StuFaps => "StuFAPs",
            Program::CoScho => "CoSCho",
            Program::Estatskolar => "Estatskolar",
        }
    }
}

impl FromStr for Program {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Program::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownValue::new("program", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchType {
    /// Notice of Award
    Noa,
    Payroll,
}

impl BatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchType::Noa => "NOA",
            BatchType::Payroll => "PAYROLL",
        }
    }
}

impl FromStr for BatchType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOA" => Ok(BatchType::Noa),
            "PAYROLL" => Ok(BatchType::Payroll),
            other => Err(UnknownValue::new("batch type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    PendingChief,
    PendingRd,
    Approved,
    Paid,
    Returned,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 5] = [
        BatchStatus::PendingChief,
        BatchStatus::PendingRd,
        BatchStatus::Approved,
        BatchStatus::Paid,
        BatchStatus::Returned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::PendingChief => "pending_chief",
            BatchStatus::PendingRd => "pending_rd",
            BatchStatus::Approved => "approved",
            BatchStatus::Paid => "paid",
            BatchStatus::Returned => "returned",
        }
    }

    /// Sequence position along the main line; `None` for `Returned`.
    pub fn rank(self) -> Option<u8> {
        match self {
            BatchStatus::PendingChief => Some(0),
            BatchStatus::PendingRd => Some(1),
            BatchStatus::Approved => Some(2),
            BatchStatus::Paid => Some(3),
            BatchStatus::Returned => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Paid | BatchStatus::Returned)
    }

    pub fn stage(self) -> Option<BatchStage> {
        match self {
            BatchStatus::PendingChief => Some(BatchStage::Chief),
            BatchStatus::PendingRd => Some(BatchStage::Rd),
            BatchStatus::Approved => Some(BatchStage::Cashier),
            BatchStatus::Paid | BatchStatus::Returned => None,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownValue::new("batch status", s))
    }
}

/// Office acting on a batch. The cashier picks up approved batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Chief,
    Rd,
    Cashier,
}

impl BatchStage {
    pub const ALL: [BatchStage; 3] = [BatchStage::Chief, BatchStage::Rd, BatchStage::Cashier];

    pub fn as_str(self) -> &'static str {
        match self {
            BatchStage::Chief => "chief",
            BatchStage::Rd => "rd",
            BatchStage::Cashier => "cashier",
        }
    }

    pub fn pending_status(self) -> BatchStatus {
        match self {
            BatchStage::Chief => BatchStatus::PendingChief,
            BatchStage::Rd => BatchStatus::PendingRd,
            BatchStage::Cashier => BatchStatus::Approved,
        }
    }
}

impl FromStr for BatchStage {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchStage::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownValue::new("batch stage", s))
    }
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub id: i64,
    pub global_academic_period_id: i64,
    pub program: Program,
    pub batch_type: BatchType,
    pub status: BatchStatus,
    pub total_amount: Option<Decimal>,
    pub remarks: Option<String>,
    pub created_by: Option<i64>,
    pub chief_approver: Option<i64>,
    pub rd_approver: Option<i64>,
    pub cashier_processor: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub chief_approved_at: Option<DateTime<Utc>>,
    pub rd_approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Batch {
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        [
            Some(self.created_at),
            Some(self.status_changed_at),
            self.chief_approved_at,
            self.rd_approved_at,
            self.paid_at,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewBatch {
    pub global_academic_period_id: i64,
    pub program: Program,
    pub batch_type: BatchType,
    pub total_amount: Option<Decimal>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/batches`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchForm {
    pub global_academic_period_id: i64,
    pub program: Program,
    pub batch_type: BatchType,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFilter {
    pub status: Option<BatchStatus>,
    pub program: Option<Program>,
    pub batch_type: Option<BatchType>,
}

impl BatchFilter {
    pub fn matches(&self, batch: &Batch) -> bool {
        self.status.is_none_or(|s| s == batch.status)
            && self.program.is_none_or(|p| p == batch.program)
            && self.batch_type.is_none_or(|t| t == batch.batch_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cashier_stage_waits_on_approved_batches() {
        assert_eq!(BatchStage::Cashier.pending_status(), BatchStatus::Approved);
        assert_eq!(BatchStatus::Approved.stage(), Some(BatchStage::Cashier));
    }

    #[test]
    fn program_names_match_official_spelling() {
        assert_eq!("stufaps".parse::<Program>().unwrap(), Program::StuFaps);
        assert_eq!(serde_json::to_string(&Program::CoScho).unwrap(), "\"CoSCho\"");
        assert_eq!(serde_json::to_string(&BatchType::Payroll).unwrap(), "\"PAYROLL\"");
    }
}
