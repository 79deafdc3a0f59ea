use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::require_actor;
use crate::errors::AppError;
use crate::handlers::api::{PageQuery, RemarksBody, paginate};
use crate::models::financial_request::{
    FinancialRequest, FinancialRequestForm, RequestFilter, RequestStage, RequestStatus,
};
use crate::workflow::Workflow;

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    /// Only the caller's own submissions.
    #[serde(default)]
    pub mine: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A request together with how long it has sat in its current status.
#[derive(Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: FinancialRequest,
    pub time_in_stage_secs: i64,
}

fn view(workflow: &Workflow, request: FinancialRequest) -> RequestView {
    let time_in_stage_secs = workflow.request_time_in_stage(&request).num_seconds();
    RequestView { request, time_in_stage_secs }
}

fn parse_stage(raw: &str) -> Result<RequestStage, AppError> {
    raw.parse::<RequestStage>()
        .map_err(|_| AppError::NotFound(format!("Stage '{raw}'")))
}

/// GET /api/requests?status=&mine=&page=&per_page=
pub async fn list(
    workflow: web::Data<Workflow>,
    session: Session,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<RequestStatus>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        None => None,
    };
    let filter = RequestFilter {
        status,
        user_id: query.mine.then_some(actor.user_id),
    };

    let requests = workflow.list_requests(&filter).await?;
    let page = PageQuery { page: query.page, per_page: query.per_page };
    Ok(HttpResponse::Ok().json(paginate(requests, page, |r| view(&workflow, r))))
}

/// POST /api/requests
pub async fn create(
    workflow: web::Data<Workflow>,
    session: Session,
    body: web::Json<FinancialRequestForm>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let request = workflow.submit_request(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view(&workflow, request)))
}

/// GET /api/requests/{id}
pub async fn read(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let request = workflow.find_request(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view(&workflow, request)))
}

/// GET /api/requests/{id}/log
pub async fn log(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let entries = workflow.request_log(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// GET /api/requests/pending/{stage}
/// Longest-waiting first.
pub async fn pending(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let stage = parse_stage(&path)?;
    let requests: Vec<RequestView> = workflow
        .list_pending_requests(stage)
        .await?
        .into_iter()
        .map(|r| view(&workflow, r))
        .collect();
    Ok(HttpResponse::Ok().json(requests))
}

/// POST /api/requests/{id}/budget/approve
pub async fn approve_budget(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.approve_budget(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/requests/{id}/accounting/approve
pub async fn approve_accounting(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.approve_accounting(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/requests/{id}/cashier/pay
pub async fn pay(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.pay_request(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/requests/{id}/budget/skip-to-cashier
pub async fn skip_to_cashier(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RemarksBody>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow
        .skip_to_cashier(path.into_inner(), &actor, body.remarks.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/requests/{id}/{stage}/reject
pub async fn reject(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<(i64, String)>,
    body: web::Json<RemarksBody>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let (id, stage) = path.into_inner();
    let stage = parse_stage(&stage)?;
    let outcome = workflow
        .reject_request(id, &actor, stage, body.remarks.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
