use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::auth::session::require_actor;
use crate::errors::AppError;
use crate::workflow::Workflow;
use crate::workflow::queries::StageSummary;

#[derive(Serialize)]
struct Dashboard {
    username: String,
    roles: Vec<String>,
    stages: Vec<StageSummary>,
}

/// GET /api/dashboard
pub async fn index(workflow: web::Data<Workflow>, session: Session) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let stages = workflow.stage_summaries().await?;
    Ok(HttpResponse::Ok().json(Dashboard {
        username: actor.username,
        roles: actor.roles.names(),
        stages,
    }))
}
