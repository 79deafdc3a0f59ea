use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::types::*;

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    subject_type: String,
    subject_id: i64,
    actor_id: Option<i64>,
    action: String,
    from_status: String,
    to_status: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<Row> for WorkflowLogEntry {
    type Error = sqlx::Error;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(WorkflowLogEntry {
            id: row.id,
            subject: Subject {
                kind: row.subject_type.parse()?,
                id: row.subject_id,
            },
            actor_id: row.actor_id,
            action: row.action.parse()?,
            from_status: row.from_status,
            to_status: row.to_status,
            remarks: row.remarks,
            created_at: row.created_at,
        })
    }
}

/// Append one log row. Callers run this inside the transaction that made
/// the status change. The row is read back so timestamps carry the stored
/// precision.
pub async fn insert(conn: &mut PgConnection, entry: NewLogEntry) -> Result<WorkflowLogEntry, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO workflow_logs \
             (subject_type, subject_id, actor_id, action, from_status, to_status, remarks, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, subject_type, subject_id, actor_id, action, from_status, to_status, remarks, created_at",
    )
    .bind(entry.subject.kind.as_str())
    .bind(entry.subject.id)
    .bind(entry.actor_id)
    .bind(entry.action.as_str())
    .bind(&entry.from_status)
    .bind(&entry.to_status)
    .bind(&entry.remarks)
    .bind(entry.created_at)
    .fetch_one(&mut *conn)
    .await?;
    row.try_into()
}

/// Full history of one entity, oldest first.
pub async fn find_for_subject(pool: &PgPool, subject: Subject) -> Result<Vec<WorkflowLogEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Row>(
        "SELECT id, subject_type, subject_id, actor_id, action, from_status, to_status, remarks, created_at \
         FROM workflow_logs \
         WHERE subject_type = $1 AND subject_id = $2 \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(WorkflowLogEntry::try_from).collect()
}
