use sqlx::PgPool;

use super::types::{NewUser, User};
use crate::auth::roles::Roles;

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    username: String,
    password_hash: String,
    display_name: String,
    roles: String,
}

impl From<Row> for User {
    fn from(row: Row) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            display_name: row.display_name,
            roles: Roles::from_csv(&row.roles),
        }
    }
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "SELECT id, username, password_hash, display_name, roles FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(User::from))
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Row>(
        "SELECT id, username, password_hash, display_name, roles FROM users ORDER BY username",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(User::from).collect())
}

/// Insert a user. `Ok(None)` if the username is already taken.
pub async fn create(pool: &PgPool, new: &NewUser) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO users (username, password_hash, display_name, roles) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (username) DO NOTHING \
         RETURNING id, username, password_hash, display_name, roles",
    )
    .bind(new.username.trim())
    .bind(&new.password_hash)
    .bind(new.display_name.trim())
    .bind(new.roles.to_csv())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(User::from))
}
