use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::types::*;

const BATCH_COLUMNS: &str = "\
    id, global_academic_period_id, program_type, batch_type, batch_status, total_amount, remarks, \
    created_by, chief_approver, rd_approver, cashier_processor, \
    created_at, status_changed_at, chief_approved_at, rd_approved_at, paid_at";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    global_academic_period_id: i64,
    program_type: String,
    batch_type: String,
    batch_status: String,
    total_amount: Option<Decimal>,
    remarks: Option<String>,
    created_by: Option<i64>,
    chief_approver: Option<i64>,
    rd_approver: Option<i64>,
    cashier_processor: Option<i64>,
    created_at: DateTime<Utc>,
    status_changed_at: DateTime<Utc>,
    chief_approved_at: Option<DateTime<Utc>>,
    rd_approved_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<Row> for Batch {
    type Error = sqlx::Error;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Batch {
            id: row.id,
            global_academic_period_id: row.global_academic_period_id,
            program: row.program_type.parse()?,
            batch_type: row.batch_type.parse()?,
            status: row.batch_status.parse()?,
            total_amount: row.total_amount,
            remarks: row.remarks,
            created_by: row.created_by,
            chief_approver: row.chief_approver,
            rd_approver: row.rd_approver,
            cashier_processor: row.cashier_processor,
            created_at: row.created_at,
            status_changed_at: row.status_changed_at,
            chief_approved_at: row.chief_approved_at,
            rd_approved_at: row.rd_approved_at,
            paid_at: row.paid_at,
        })
    }
}

fn convert(rows: Vec<Row>) -> Result<Vec<Batch>, sqlx::Error> {
    rows.into_iter().map(Batch::try_from).collect()
}

pub async fn create(pool: &PgPool, new: &NewBatch) -> Result<Batch, sqlx::Error> {
    let sql = format!(
        "INSERT INTO batches \
             (global_academic_period_id, program_type, batch_type, batch_status, total_amount, \
              created_by, created_at, status_changed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
         RETURNING {BATCH_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(new.global_academic_period_id)
        .bind(new.program.as_str())
        .bind(new.batch_type.as_str())
        .bind(BatchStatus::PendingChief.as_str())
        .bind(new.total_amount)
        .bind(new.created_by)
        .bind(new.created_at)
        .fetch_one(pool)
        .await?;
    row.try_into()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Batch>, sqlx::Error> {
    let sql = format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Batch::try_from).transpose()
}

pub async fn find_filtered(pool: &PgPool, filter: &BatchFilter) -> Result<Vec<Batch>, sqlx::Error> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM batches \
         WHERE ($1::TEXT IS NULL OR batch_status = $1) \
           AND ($2::TEXT IS NULL OR program_type = $2) \
           AND ($3::TEXT IS NULL OR batch_type = $3) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.program.map(|p| p.as_str()))
        .bind(filter.batch_type.map(|t| t.as_str()))
        .fetch_all(pool)
        .await?;
    convert(rows)
}

pub async fn find_by_status(pool: &PgPool, status: BatchStatus) -> Result<Vec<Batch>, sqlx::Error> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE batch_status = $1 \
         ORDER BY status_changed_at ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    convert(rows)
}

/// Conditional write guarded by the expected batch status; `None` if the
/// stored status moved on.
pub async fn update_if_status(
    conn: &mut PgConnection,
    expected: BatchStatus,
    next: &Batch,
) -> Result<Option<Batch>, sqlx::Error> {
    let sql = format!(
        "UPDATE batches SET \
             batch_status = $3, remarks = $4, chief_approver = $5, rd_approver = $6, \
             cashier_processor = $7, status_changed_at = $8, chief_approved_at = $9, \
             rd_approved_at = $10, paid_at = $11 \
         WHERE id = $1 AND batch_status = $2 \
         RETURNING {BATCH_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(next.id)
        .bind(expected.as_str())
        .bind(next.status.as_str())
        .bind(&next.remarks)
        .bind(next.chief_approver)
        .bind(next.rd_approver)
        .bind(next.cashier_processor)
        .bind(next.status_changed_at)
        .bind(next.chief_approved_at)
        .bind(next.rd_approved_at)
        .bind(next.paid_at)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Batch::try_from).transpose()
}
