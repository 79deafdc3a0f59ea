use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::types::*;

const SELECT_REQUEST: &str = "\
    SELECT id, user_id, title, request_type, amount, status, remarks, accounting_bypassed, \
           created_at, status_changed_at, budget_approved_at, accounting_approved_at, cashier_paid_at \
    FROM financial_requests";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    user_id: i64,
    title: String,
    request_type: String,
    amount: Decimal,
    status: String,
    remarks: Option<String>,
    accounting_bypassed: bool,
    created_at: DateTime<Utc>,
    status_changed_at: DateTime<Utc>,
    budget_approved_at: Option<DateTime<Utc>>,
    accounting_approved_at: Option<DateTime<Utc>>,
    cashier_paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<Row> for FinancialRequest {
    type Error = sqlx::Error;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(FinancialRequest {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            request_type: row.request_type.parse()?,
            amount: row.amount,
            status: row.status.parse()?,
            remarks: row.remarks,
            accounting_bypassed: row.accounting_bypassed,
            created_at: row.created_at,
            status_changed_at: row.status_changed_at,
            budget_approved_at: row.budget_approved_at,
            accounting_approved_at: row.accounting_approved_at,
            cashier_paid_at: row.cashier_paid_at,
        })
    }
}

fn convert(rows: Vec<Row>) -> Result<Vec<FinancialRequest>, sqlx::Error> {
    rows.into_iter().map(FinancialRequest::try_from).collect()
}

/// Insert a new request at `pending_budget`.
pub async fn create(pool: &PgPool, new: &NewFinancialRequest) -> Result<FinancialRequest, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "INSERT INTO financial_requests \
             (user_id, title, request_type, amount, status, created_at, status_changed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $6) \
         RETURNING id, user_id, title, request_type, amount, status, remarks, accounting_bypassed, \
                   created_at, status_changed_at, budget_approved_at, accounting_approved_at, cashier_paid_at",
    )
    .bind(new.user_id)
    .bind(&new.title)
    .bind(new.request_type.as_str())
    .bind(new.amount)
    .bind(RequestStatus::PendingBudget.as_str())
    .bind(new.created_at)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<FinancialRequest>, sqlx::Error> {
    let sql = format!("{SELECT_REQUEST} WHERE id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(FinancialRequest::try_from).transpose()
}

/// All requests matching the filter, newest first.
pub async fn find_filtered(pool: &PgPool, filter: &RequestFilter) -> Result<Vec<FinancialRequest>, sqlx::Error> {
    let sql = format!(
        "{SELECT_REQUEST} \
         WHERE ($1::TEXT IS NULL OR status = $1) AND ($2::BIGINT IS NULL OR user_id = $2) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.user_id)
        .fetch_all(pool)
        .await?;
    convert(rows)
}

/// Requests sitting in one status, longest-waiting first.
pub async fn find_by_status(pool: &PgPool, status: RequestStatus) -> Result<Vec<FinancialRequest>, sqlx::Error> {
    let sql = format!("{SELECT_REQUEST} WHERE status = $1 ORDER BY status_changed_at ASC, id ASC");
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    convert(rows)
}

/// Write every mutable column of `next`, but only if the stored status still
/// equals `expected`. Returns `None` when the precondition fails.
pub async fn update_if_status(
    conn: &mut PgConnection,
    expected: RequestStatus,
    next: &FinancialRequest,
) -> Result<Option<FinancialRequest>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(
        "UPDATE financial_requests SET \
             status = $3, remarks = $4, accounting_bypassed = $5, status_changed_at = $6, \
             budget_approved_at = $7, accounting_approved_at = $8, cashier_paid_at = $9 \
         WHERE id = $1 AND status = $2 \
         RETURNING id, user_id, title, request_type, amount, status, remarks, accounting_bypassed, \
                   created_at, status_changed_at, budget_approved_at, accounting_approved_at, cashier_paid_at",
    )
    .bind(next.id)
    .bind(expected.as_str())
    .bind(next.status.as_str())
    .bind(&next.remarks)
    .bind(next.accounting_bypassed)
    .bind(next.status_changed_at)
    .bind(next.budget_approved_at)
    .bind(next.accounting_approved_at)
    .bind(next.cashier_paid_at)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(FinancialRequest::try_from).transpose()
}
