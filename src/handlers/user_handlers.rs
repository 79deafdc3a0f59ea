use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::accounts;
use crate::auth::guard::Action;
use crate::auth::session::require_actor;
use crate::errors::AppError;
use crate::models::user::{UserDisplay, UserForm};
use crate::workflow::Workflow;

/// GET /api/users
pub async fn list(workflow: web::Data<Workflow>, session: Session) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    workflow.authorize(&actor, Action::ManageUsers, None).await?;
    let users: Vec<UserDisplay> = workflow
        .store()
        .list_users()
        .await?
        .iter()
        .map(UserDisplay::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/users
pub async fn create(
    workflow: web::Data<Workflow>,
    session: Session,
    body: web::Json<UserForm>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let user = accounts::create_user(&workflow, &actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserDisplay::from(&user)))
}
