use serde::{Deserialize, Serialize};

use crate::auth::roles::Roles;

/// Internal user struct for authentication; includes the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub roles: Roles,
}

/// Safe version for API responses, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserDisplay {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        UserDisplay {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            roles: user.roles.names(),
        }
    }
}

/// New user data for creation; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub roles: Roles,
}

/// Body of `POST /api/users`.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub roles: Vec<crate::auth::roles::Role>,
}
