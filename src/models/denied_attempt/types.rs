use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::models::UnknownValue;
use crate::models::workflow_log::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Actor lacked a role allowed for the action.
    Forbidden,
    /// Entity was not in the status the action expects.
    Conflict,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::Forbidden => "forbidden",
            DenialReason::Conflict => "conflict",
        }
    }
}

impl FromStr for DenialReason {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forbidden" => Ok(DenialReason::Forbidden),
            "conflict" => Ok(DenialReason::Conflict),
            other => Err(UnknownValue::new("denial reason", other)),
        }
    }
}

/// A refused workflow call. Kept apart from the transition log so that log
/// holds exactly one row per state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeniedAttempt {
    pub id: i64,
    pub actor_id: i64,
    pub action: String,
    pub subject: Option<Subject>,
    pub reason: DenialReason,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDeniedAttempt {
    pub actor_id: i64,
    pub action: String,
    pub subject: Option<Subject>,
    pub reason: DenialReason,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl NewDeniedAttempt {
    pub fn into_attempt(self, id: i64) -> DeniedAttempt {
        DeniedAttempt {
            id,
            actor_id: self.actor_id,
            action: self.action,
            subject: self.subject,
            reason: self.reason,
            detail: self.detail,
            created_at: self.created_at,
        }
    }
}
