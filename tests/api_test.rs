//! End-to-end tests of the JSON API over an in-memory store.

mod common;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use common::MutableClock;
use grantflow::accounts;
use grantflow::auth::rate_limit::LoginRateLimiter;
use grantflow::handlers;
use grantflow::store::MemoryStore;
use grantflow::workflow::Workflow;

const PASSWORD: &str = "admin123";

async fn workflow() -> Workflow {
    let store = Arc::new(MemoryStore::new());
    accounts::seed_users(store.as_ref(), PASSWORD, true)
        .await
        .expect("seed users");
    Workflow::new(store, Arc::new(MutableClock::new(common::start_time())))
}

async fn app(
    workflow: Workflow,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(workflow))
            .app_data(web::Data::new(LoginRateLimiter::new()))
            .configure(handlers::configure),
    )
    .await
}

async fn login<S>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": username, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "login as {username}");
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .expect("session cookie")
}

async fn post<S>(app: &S, cookie: &Cookie<'static>, uri: &str, body: Value) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .cookie(cookie.clone())
        .set_json(body)
        .to_request();
    test::call_service(app, req).await
}

async fn get<S>(app: &S, cookie: &Cookie<'static>, uri: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get().uri(uri).cookie(cookie.clone()).to_request();
    test::call_service(app, req).await
}

#[actix_web::test]
async fn protected_routes_need_a_session() {
    let app = app(workflow().await).await;

    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/requests").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_rejects_bad_credentials_and_returns_roles() {
    let app = app(workflow().await).await;

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "budget", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "rd").await;
    let me: Value = test::read_body_json(get(&app, &cookie, "/api/me").await).await;
    assert_eq!(me["username"], "rd");
    assert_eq!(me["roles"], json!(["RD"]));
}

#[actix_web::test]
async fn repeated_login_failures_are_rate_limited() {
    let app = app(workflow().await).await;

    for _ in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": "nobody", "password": "whatever1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": "admin", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn mutations_must_be_json() {
    let app = app(workflow().await).await;
    let cookie = login(&app, "staff").await;

    let req = test::TestRequest::post()
        .uri("/api/requests")
        .cookie(cookie)
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("title=Fare&request_type=Reimbursement&amount=10")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn request_pipeline_status_codes() {
    let app = app(workflow().await).await;
    let staff = login(&app, "staff").await;
    let budget = login(&app, "budget").await;

    let resp = post(
        &app,
        &staff,
        "/api/requests",
        json!({ "title": "Seminar fees", "request_type": "Cash Advance", "amount": "4500.00" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "pending_budget");
    let id = created["id"].as_i64().expect("id");

    let approve = format!("/api/requests/{id}/budget/approve");
    let resp = post(&app, &staff, &approve, json!({})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = post(&app, &budget, &approve, json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = test::read_body_json(resp).await;
    assert_eq!(outcome["entity"]["status"], "pending_accounting");
    assert_eq!(outcome["log"]["action"], "budget_approved");

    let resp = post(&app, &budget, &approve, json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "conflict");

    let accounting = login(&app, "accounting").await;
    let reject = format!("/api/requests/{id}/accounting/reject");
    let resp = post(&app, &accounting, &reject, json!({ "remarks": "  " })).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post(&app, &accounting, &reject, json!({ "remarks": "insufficient funds" })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let log: Value = test::read_body_json(get(&app, &staff, &format!("/api/requests/{id}/log")).await).await;
    assert_eq!(log.as_array().map(Vec::len), Some(2));
    assert_eq!(log[1]["remarks"], "insufficient funds");

    let resp = get(&app, &staff, "/api/requests/9999").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = post(&app, &accounting, &format!("/api/requests/{id}/registrar/reject"), json!({ "remarks": "x" })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn batches_and_admin_endpoints() {
    let app = app(workflow().await).await;
    let admin = login(&app, "admin").await;
    let chief = login(&app, "chief").await;
    let rd = login(&app, "rd").await;

    let resp = post(
        &app,
        &admin,
        "/api/batches",
        json!({ "global_academic_period_id": 3, "program": "TDP", "batch_type": "NOA", "total_amount": null }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let batch: Value = test::read_body_json(resp).await;
    let id = batch["id"].as_i64().expect("id");

    let resp = post(&app, &chief, &format!("/api/batches/{id}/chief/return"), json!({ "remarks": "Incomplete roster" })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = post(&app, &rd, &format!("/api/batches/{id}/rd/approve"), json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let pending: Value = test::read_body_json(get(&app, &rd, "/api/batches/pending/rd").await).await;
    assert_eq!(pending, json!([]));

    let resp = get(&app, &rd, "/api/audit/denied").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let denied: Value = test::read_body_json(get(&app, &admin, "/api/audit/denied?limit=10").await).await;
    let reasons: Vec<&str> = denied
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|d| d["reason"].as_str())
        .collect();
    assert_eq!(reasons, vec!["forbidden", "conflict"]);

    let resp = post(
        &app,
        &admin,
        "/api/users",
        json!({ "username": "budget2", "password": "longenough", "display_name": "Second Budget", "roles": ["Budget"] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = post(
        &app,
        &admin,
        "/api/users",
        json!({ "username": "budget2", "password": "longenough", "display_name": "Again", "roles": ["Budget"] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let dashboard: Value = test::read_body_json(get(&app, &admin, "/api/dashboard").await).await;
    assert_eq!(dashboard["stages"].as_array().map(Vec::len), Some(6));
}
