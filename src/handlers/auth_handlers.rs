use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

use crate::accounts;
use crate::auth::rate_limit::LoginRateLimiter;
use crate::auth::session::{require_actor, sign_in};
use crate::errors::AppError;
use crate::models::user::UserDisplay;
use crate::workflow::Workflow;

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// POST /api/login
pub async fn login(
    req: HttpRequest,
    workflow: web::Data<Workflow>,
    session: Session,
    limiter: web::Data<LoginRateLimiter>,
    body: web::Json<LoginBody>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        return Ok(HttpResponse::TooManyRequests().json(serde_json::json!({
            "error": "Too many failed login attempts. Please try again later.",
            "kind": "rate_limited",
        })));
    }

    match accounts::authenticate(workflow.store().as_ref(), &body.username, &body.password).await? {
        Some(user) => {
            limiter.clear(ip);
            sign_in(&session, user.id, &user.username, &user.roles)?;
            log::info!("User {} signed in", user.username);
            Ok(HttpResponse::Ok().json(UserDisplay::from(&user)))
        }
        None => {
            limiter.record_failure(ip);
            Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid username or password",
                "kind": "unauthenticated",
            })))
        }
    }
}

/// POST /api/logout
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// GET /api/me
pub async fn me(session: Session) -> Result<HttpResponse, AppError> {
    let actor = require_actor(&session)?;
    Ok(HttpResponse::Ok().json(actor))
}
