use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::require_actor;
use crate::errors::AppError;
use crate::handlers::api::{PageQuery, RemarksBody, paginate};
use crate::models::batch::{Batch, BatchFilter, BatchForm, BatchStage, BatchStatus, BatchType, Program};
use crate::workflow::Workflow;

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub program: Option<String>,
    pub batch_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    fn filter(&self) -> Result<BatchFilter, AppError> {
        fn parse<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, AppError>
        where
            T::Err: std::fmt::Display,
        {
            raw.filter(|s| !s.is_empty())
                .map(|s| s.parse::<T>().map_err(|e| AppError::Validation(e.to_string())))
                .transpose()
        }

        Ok(BatchFilter {
            status: parse::<BatchStatus>(self.status.as_deref())?,
            program: parse::<Program>(self.program.as_deref())?,
            batch_type: parse::<BatchType>(self.batch_type.as_deref())?,
        })
    }
}

#[derive(Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub time_in_stage_secs: i64,
}

fn view(workflow: &Workflow, batch: Batch) -> BatchView {
    let time_in_stage_secs = workflow.batch_time_in_stage(&batch).num_seconds();
    BatchView { batch, time_in_stage_secs }
}

fn parse_stage(raw: &str) -> Result<BatchStage, AppError> {
    raw.parse::<BatchStage>()
        .map_err(|_| AppError::NotFound(format!("Stage '{raw}'")))
}

/// GET /api/batches?status=&program=&batch_type=&page=&per_page=
pub async fn list(
    workflow: web::Data<Workflow>,
    session: Session,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let filter = query.filter()?;
    let batches = workflow.list_batches(&filter).await?;
    let page = PageQuery { page: query.page, per_page: query.per_page };
    Ok(HttpResponse::Ok().json(paginate(batches, page, |b| view(&workflow, b))))
}

/// POST /api/batches
pub async fn create(
    workflow: web::Data<Workflow>,
    session: Session,
    body: web::Json<BatchForm>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let batch = workflow.create_batch(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view(&workflow, batch)))
}

/// GET /api/batches/{id}
pub async fn read(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let batch = workflow.find_batch(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view(&workflow, batch)))
}

/// GET /api/batches/{id}/log
pub async fn log(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let entries = workflow.batch_log(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// GET /api/batches/pending/{stage}
pub async fn pending(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_actor(&session)?;
    let stage = parse_stage(&path)?;
    let batches: Vec<BatchView> = workflow
        .list_pending_batches(stage)
        .await?
        .into_iter()
        .map(|b| view(&workflow, b))
        .collect();
    Ok(HttpResponse::Ok().json(batches))
}

/// POST /api/batches/{id}/chief/approve
pub async fn approve_chief(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.approve_batch_chief(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/batches/{id}/rd/approve
pub async fn approve_rd(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.approve_batch_rd(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/batches/{id}/cashier/pay
pub async fn pay(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let outcome = workflow.pay_batch(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/batches/{id}/{stage}/return
pub async fn return_batch(
    workflow: web::Data<Workflow>,
    session: Session,
    path: web::Path<(i64, String)>,
    body: web::Json<RemarksBody>,
) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    let (id, stage) = path.into_inner();
    let stage = parse_stage(&stage)?;
    let outcome = workflow
        .return_batch(id, &actor, stage, body.remarks.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
