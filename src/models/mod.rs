pub mod batch;
pub mod denied_attempt;
pub mod financial_request;
pub mod user;
pub mod workflow_log;

use std::fmt;

/// A stored string that does not name any known enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub fn new(field: &'static str, value: &str) -> Self {
        UnknownValue {
            field,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.field, self.value)
    }
}

impl std::error::Error for UnknownValue {}

impl From<UnknownValue> for sqlx::Error {
    fn from(e: UnknownValue) -> Self {
        sqlx::Error::Decode(Box::new(e))
    }
}
