use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::require_actor;
use crate::errors::AppError;
use crate::workflow::Workflow;

#[derive(Deserialize)]
pub struct DeniedQuery {
    limit: Option<i64>,
}

/// GET /api/audit/denied?limit=
/// Most recent refused calls first. Admin only.
pub async fn denied(
    workflow: web::Data<Workflow>,
    session: Session,
    query: web::Query<DeniedQuery>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let attempts = workflow
        .recent_denials(&actor, query.limit.unwrap_or(50))
        .await?;
    Ok(HttpResponse::Ok().json(attempts))
}
