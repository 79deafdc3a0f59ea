use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::types::*;
use crate::models::workflow_log::Subject;

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    actor_id: i64,
    action: String,
    subject_type: Option<String>,
    subject_id: Option<i64>,
    reason: String,
    detail: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<Row> for DeniedAttempt {
    type Error = sqlx::Error;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let subject = match (row.subject_type, row.subject_id) {
            (Some(kind), Some(id)) => Some(Subject { kind: kind.parse()?, id }),
            _ => None,
        };
        Ok(DeniedAttempt {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action,
            subject,
            reason: row.reason.parse()?,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

pub async fn insert(pool: &PgPool, attempt: NewDeniedAttempt) -> Result<DeniedAttempt, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO denied_attempts \
             (actor_id, action, subject_type, subject_id, reason, detail, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, actor_id, action, subject_type, subject_id, reason, detail, created_at",
    )
    .bind(attempt.actor_id)
    .bind(&attempt.action)
    .bind(attempt.subject.map(|s| s.kind.as_str()))
    .bind(attempt.subject.map(|s| s.id))
    .bind(attempt.reason.as_str())
    .bind(&attempt.detail)
    .bind(attempt.created_at)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

/// Most recent denials first.
pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<DeniedAttempt>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Row>(
        "SELECT id, actor_id, action, subject_type, subject_id, reason, detail, created_at \
         FROM denied_attempts ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DeniedAttempt::try_from).collect()
}
