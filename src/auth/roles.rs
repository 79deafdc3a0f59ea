use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::UnknownValue;

/// Staff roles known to the disbursement workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Budget,
    Accounting,
    Cashier,
    Chief,
    #[serde(rename = "RD")]
    RegionalDirector,
    Staff,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Budget,
        Role::Accounting,
        Role::Cashier,
        Role::Chief,
        Role::RegionalDirector,
        Role::Staff,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Budget => "Budget",
            Role::Accounting => "Accounting",
            Role::Cashier => "Cashier",
            Role::Chief => "Chief",
            Role::RegionalDirector => "RD",
            Role::Staff => "Staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownValue::new("role", s))
    }
}

/// Wrapper around the roles an actor holds, with a `has()` check mirroring
/// the session permission helper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles(pub Vec<Role>);

impl Roles {
    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn has_any(&self, wanted: &[Role]) -> bool {
        wanted.iter().any(|r| self.has(*r))
    }

    /// Parse a comma-separated role list. Unknown names are skipped with a
    /// warning so a stale session never grants anything extra.
    pub fn from_csv(csv: &str) -> Self {
        let mut roles = Vec::new();
        for name in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.parse::<Role>() {
                Ok(role) if !roles.contains(&role) => roles.push(role),
                Ok(_) => {}
                Err(e) => log::warn!("Ignoring {e}"),
            }
        }
        Roles(roles)
    }

    pub fn to_csv(&self) -> String {
        self.0
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_names_case_insensitively() {
        assert_eq!("rd".parse::<Role>().unwrap(), Role::RegionalDirector);
        assert_eq!(" Cashier ".parse::<Role>().unwrap(), Role::Cashier);
        assert!("Registrar".parse::<Role>().is_err());
    }

    #[test]
    fn csv_round_trip_drops_unknown_and_duplicates() {
        let roles = Roles::from_csv("Budget, Chief,,Budget,Janitor");
        assert_eq!(roles.0, vec![Role::Budget, Role::Chief]);
        assert_eq!(roles.to_csv(), "Budget,Chief");
    }

    #[test]
    fn has_any_matches_a_single_overlap() {
        let roles = Roles(vec![Role::Accounting]);
        assert!(roles.has_any(&[Role::Budget, Role::Accounting]));
        assert!(!roles.has_any(&[Role::Cashier]));
    }
}
